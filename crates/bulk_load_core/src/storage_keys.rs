pub const ASSET_MODELS_TABLE: &str = "asset_models.csv";
pub const HIERARCHIES_TABLE: &str = "hierarchies.csv";
pub const ASSETS_TABLE: &str = "assets.csv";

const DATA_FILE_STEM: &str = "historical_data";
const PROPERTY_SCHEMA_SUFFIX: &str = "_properties.json";

/// Name of the `file_num`-th generated data file; numbering starts at 1.
pub fn data_file_name(file_num: usize) -> String {
    format!("{DATA_FILE_STEM}_{file_num}.csv")
}

/// Object key for an uploaded data file. The prefix is used verbatim, so a
/// prefix meant as a folder must carry its own trailing `/`.
pub fn data_object_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}{file_name}")
}

pub fn property_schema_file_name(model_name: &str) -> String {
    let stem = model_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{stem}{PROPERTY_SCHEMA_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_numbered_data_file_name() {
        assert_eq!(data_file_name(1), "historical_data_1.csv");
        assert_eq!(data_file_name(12), "historical_data_12.csv");
    }

    #[test]
    fn object_key_concatenates_prefix_verbatim() {
        assert_eq!(
            data_object_key("history/", "historical_data_3.csv"),
            "history/historical_data_3.csv"
        );
        assert_eq!(
            data_object_key("", "historical_data_3.csv"),
            "historical_data_3.csv"
        );
    }

    #[test]
    fn schema_file_name_collapses_whitespace() {
        assert_eq!(
            property_schema_file_name("Sample_Stamping Press"),
            "sample_stamping_press_properties.json"
        );
        assert_eq!(
            property_schema_file_name("  Press   Line "),
            "press_line_properties.json"
        );
    }
}
