//! AWS SDK implementations of the service ports.
//!
//! The ports are synchronous; each call bridges into the async SDK with
//! `block_in_place` + `Handle::block_on`, so these adapters must be used from
//! a multi-threaded tokio runtime.

use std::future::Future;
use std::path::Path;

use aws_sdk_iotsitewise::error::DisplayErrorContext;
use aws_sdk_iotsitewise::types as sitewise;
use aws_sdk_s3::primitives::ByteStream;
use bulk_load_core::contract::{BulkImportJobRequest, JobSummary};
use bulk_load_core::settings::{PropertyDefinition, PropertyKind};
use bulk_load_core::status::ResourceState;

use crate::adapters::asset_service::{
    AssetLink, AssetModelUpdate, AssetService, AssetSummary, HierarchyDefinition,
    HierarchySummary, ModelSummary, PropertySummary,
};
use crate::adapters::bulk_import::BulkImportService;
use crate::adapters::object_store::ObjectStore;

const LIST_PAGE_SIZE: i32 = 100;
const JOB_LIST_PAGE_SIZE: i32 = 250;

pub async fn load_sdk_config(
    profile: Option<&str>,
    region: Option<&str>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(aws_sdk_iotsitewise::config::Region::new(region.to_string()));
    }
    loader.load().await
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

// SDK accessors are `&T` for some required members and `Option<&T>` for
// others; both convert into `Option<&T>`.
fn present<'a, T: ?Sized>(value: impl Into<Option<&'a T>>) -> Option<&'a T> {
    value.into()
}

fn required<T: ?Sized + ToOwned>(
    value: Option<&T>,
    operation: &str,
    field: &str,
) -> Result<T::Owned, String> {
    value
        .map(ToOwned::to_owned)
        .ok_or_else(|| format!("{operation} response is missing {field}"))
}

/// Builders return `Result` only when the shape has required members; this
/// lets both kinds be finished the same way.
trait FinishBuild<T> {
    fn finish(self, what: &str) -> Result<T, String>;
}

impl<T> FinishBuild<T> for Result<T, aws_sdk_iotsitewise::error::BuildError> {
    fn finish(self, what: &str) -> Result<T, String> {
        self.map_err(|error| format!("invalid {what}: {error}"))
    }
}

impl FinishBuild<sitewise::Csv> for sitewise::Csv {
    fn finish(self, _what: &str) -> Result<sitewise::Csv, String> {
        Ok(self)
    }
}

impl FinishBuild<sitewise::JobConfiguration> for sitewise::JobConfiguration {
    fn finish(self, _what: &str) -> Result<sitewise::JobConfiguration, String> {
        Ok(self)
    }
}

fn sdk_error<E: std::error::Error>(operation: &str, error: E) -> String {
    format!("{operation}: {}", DisplayErrorContext(&error))
}

fn collect_pages<T>(
    mut fetch_page: impl FnMut(Option<String>) -> Result<(Vec<T>, Option<String>), String>,
) -> Result<Vec<T>, String> {
    let mut items = Vec::new();
    let mut token = None;
    loop {
        let (page, next_token) = fetch_page(token.take())?;
        items.extend(page);
        match next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(items),
        }
    }
}

fn property_type(kind: &PropertyKind) -> sitewise::PropertyType {
    match kind {
        PropertyKind::Measurement {} => sitewise::PropertyType::builder()
            .measurement(sitewise::Measurement::builder().build())
            .build(),
        PropertyKind::Attribute { default_value } => sitewise::PropertyType::builder()
            .attribute(
                sitewise::Attribute::builder()
                    .set_default_value(default_value.clone())
                    .build(),
            )
            .build(),
    }
}

// CreateAssetModel takes definitions; UpdateAssetModel takes full properties.
fn property_definition(
    definition: &PropertyDefinition,
) -> Result<sitewise::AssetModelPropertyDefinition, String> {
    sitewise::AssetModelPropertyDefinition::builder()
        .name(&definition.name)
        .data_type(sitewise::PropertyDataType::from(definition.data_type.as_str()))
        .set_unit(definition.unit.clone())
        .r#type(property_type(&definition.kind))
        .build()
        .map_err(|error| format!("invalid property definition '{}': {error}", definition.name))
}

fn update_property(
    definition: &PropertyDefinition,
) -> Result<sitewise::AssetModelProperty, String> {
    sitewise::AssetModelProperty::builder()
        .name(&definition.name)
        .data_type(sitewise::PropertyDataType::from(definition.data_type.as_str()))
        .set_unit(definition.unit.clone())
        .r#type(property_type(&definition.kind))
        .build()
        .map_err(|error| format!("invalid property '{}': {error}", definition.name))
}

fn update_hierarchy(
    hierarchy: &HierarchyDefinition,
) -> Result<sitewise::AssetModelHierarchy, String> {
    sitewise::AssetModelHierarchy::builder()
        .name(&hierarchy.name)
        .child_asset_model_id(&hierarchy.child_asset_model_id)
        .build()
        .map_err(|error| format!("invalid hierarchy '{}': {error}", hierarchy.name))
}

#[derive(Debug, Clone)]
pub struct SiteWiseAdapter {
    client: aws_sdk_iotsitewise::Client,
}

impl SiteWiseAdapter {
    pub fn new(client: aws_sdk_iotsitewise::Client) -> Self {
        Self { client }
    }
}

impl AssetService for SiteWiseAdapter {
    fn create_asset_model(
        &self,
        name: &str,
        properties: &[PropertyDefinition],
    ) -> Result<String, String> {
        let definitions = properties
            .iter()
            .map(property_definition)
            .collect::<Result<Vec<_>, String>>()?;
        let output = block_on(
            self.client
                .create_asset_model()
                .asset_model_name(name)
                .set_asset_model_properties(Some(definitions))
                .send(),
        )
        .map_err(|error| sdk_error("CreateAssetModel", error))?;
        required(
            present::<str>(output.asset_model_id()),
            "CreateAssetModel",
            "assetModelId",
        )
    }

    fn update_asset_model(&self, update: &AssetModelUpdate<'_>) -> Result<(), String> {
        let properties = update
            .properties
            .iter()
            .map(update_property)
            .collect::<Result<Vec<_>, String>>()?;
        let hierarchies = update
            .hierarchies
            .iter()
            .map(update_hierarchy)
            .collect::<Result<Vec<_>, String>>()?;

        block_on(
            self.client
                .update_asset_model()
                .asset_model_id(update.model_id)
                .asset_model_name(update.model_name)
                .set_asset_model_properties(Some(properties))
                .set_asset_model_hierarchies(Some(hierarchies))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("UpdateAssetModel", error))
    }

    fn asset_model_state(&self, model_id: &str) -> Result<ResourceState, String> {
        let output = block_on(
            self.client
                .describe_asset_model()
                .asset_model_id(model_id)
                .exclude_properties(true)
                .send(),
        )
        .map_err(|error| sdk_error("DescribeAssetModel", error))?;
        let state = present::<sitewise::AssetModelStatus>(output.asset_model_status())
            .and_then(|status| present::<sitewise::AssetModelState>(status.state()))
            .ok_or_else(|| "DescribeAssetModel response is missing assetModelStatus".to_string())?;
        Ok(ResourceState::parse(state.as_str()))
    }

    fn asset_model_hierarchies(&self, model_id: &str) -> Result<Vec<HierarchySummary>, String> {
        let output = block_on(
            self.client
                .describe_asset_model()
                .asset_model_id(model_id)
                .exclude_properties(true)
                .send(),
        )
        .map_err(|error| sdk_error("DescribeAssetModel", error))?;

        present::<[sitewise::AssetModelHierarchy]>(output.asset_model_hierarchies())
            .unwrap_or_default()
            .iter()
            .map(|hierarchy| {
                Ok(HierarchySummary {
                    id: required(present::<str>(hierarchy.id()), "DescribeAssetModel", "id")?,
                    name: required(present::<str>(hierarchy.name()), "DescribeAssetModel", "name")?,
                    child_asset_model_id: required(
                        present::<str>(hierarchy.child_asset_model_id()),
                        "DescribeAssetModel",
                        "childAssetModelId",
                    )?,
                })
            })
            .collect()
    }

    fn delete_asset_model(&self, model_id: &str) -> Result<(), String> {
        block_on(
            self.client
                .delete_asset_model()
                .asset_model_id(model_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("DeleteAssetModel", error))
    }

    fn list_asset_models(&self) -> Result<Vec<ModelSummary>, String> {
        collect_pages(|token| {
            let output = block_on(
                self.client
                    .list_asset_models()
                    .max_results(LIST_PAGE_SIZE)
                    .set_next_token(token)
                    .send(),
            )
            .map_err(|error| sdk_error("ListAssetModels", error))?;
            let page = present::<[sitewise::AssetModelSummary]>(output.asset_model_summaries())
                .unwrap_or_default()
                .iter()
                .map(|summary| {
                    Ok(ModelSummary {
                        id: required(present::<str>(summary.id()), "ListAssetModels", "id")?,
                        name: required(present::<str>(summary.name()), "ListAssetModels", "name")?,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            Ok((page, output.next_token().map(str::to_string)))
        })
    }

    fn list_asset_model_properties(&self, model_id: &str) -> Result<Vec<PropertySummary>, String> {
        collect_pages(|token| {
            let output = block_on(
                self.client
                    .list_asset_model_properties()
                    .asset_model_id(model_id)
                    .max_results(LIST_PAGE_SIZE)
                    .set_next_token(token)
                    .send(),
            )
            .map_err(|error| sdk_error("ListAssetModelProperties", error))?;
            let page = present::<[sitewise::AssetModelPropertySummary]>(
                output.asset_model_property_summaries(),
            )
            .unwrap_or_default()
            .iter()
            .map(|summary| {
                Ok(PropertySummary {
                    id: required(
                        present::<str>(summary.id()),
                        "ListAssetModelProperties",
                        "id",
                    )?,
                    name: required(
                        present::<str>(summary.name()),
                        "ListAssetModelProperties",
                        "name",
                    )?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
            Ok((page, output.next_token().map(str::to_string)))
        })
    }

    fn create_asset(&self, name: &str, model_id: &str) -> Result<String, String> {
        let output = block_on(
            self.client
                .create_asset()
                .asset_name(name)
                .asset_model_id(model_id)
                .send(),
        )
        .map_err(|error| sdk_error("CreateAsset", error))?;
        required(present::<str>(output.asset_id()), "CreateAsset", "assetId")
    }

    fn asset_state(&self, asset_id: &str) -> Result<ResourceState, String> {
        let output = block_on(self.client.describe_asset().asset_id(asset_id).send())
            .map_err(|error| sdk_error("DescribeAsset", error))?;
        let state = present::<sitewise::AssetStatus>(output.asset_status())
            .and_then(|status| present::<sitewise::AssetState>(status.state()))
            .ok_or_else(|| "DescribeAsset response is missing assetStatus".to_string())?;
        Ok(ResourceState::parse(state.as_str()))
    }

    fn delete_asset(&self, asset_id: &str) -> Result<(), String> {
        block_on(self.client.delete_asset().asset_id(asset_id).send())
            .map(|_| ())
            .map_err(|error| sdk_error("DeleteAsset", error))
    }

    fn list_assets(&self, model_id: &str) -> Result<Vec<AssetSummary>, String> {
        collect_pages(|token| {
            let output = block_on(
                self.client
                    .list_assets()
                    .asset_model_id(model_id)
                    .max_results(LIST_PAGE_SIZE)
                    .set_next_token(token)
                    .send(),
            )
            .map_err(|error| sdk_error("ListAssets", error))?;
            let page = present::<[sitewise::AssetSummary]>(output.asset_summaries())
                .unwrap_or_default()
                .iter()
                .map(|summary| {
                    Ok(AssetSummary {
                        id: required(present::<str>(summary.id()), "ListAssets", "id")?,
                        name: required(present::<str>(summary.name()), "ListAssets", "name")?,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            Ok((page, output.next_token().map(str::to_string)))
        })
    }

    fn associate_assets(&self, link: &AssetLink<'_>) -> Result<(), String> {
        block_on(
            self.client
                .associate_assets()
                .asset_id(link.parent_asset_id)
                .hierarchy_id(link.hierarchy_id)
                .child_asset_id(link.child_asset_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("AssociateAssets", error))
    }

    fn disassociate_assets(&self, link: &AssetLink<'_>) -> Result<(), String> {
        block_on(
            self.client
                .disassociate_assets()
                .asset_id(link.parent_asset_id)
                .hierarchy_id(link.hierarchy_id)
                .child_asset_id(link.child_asset_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("DisassociateAssets", error))
    }
}

impl BulkImportService for SiteWiseAdapter {
    fn create_bulk_import_job(&self, request: &BulkImportJobRequest) -> Result<String, String> {
        let files = request
            .files
            .iter()
            .map(|file| {
                sitewise::File::builder()
                    .bucket(&file.bucket)
                    .key(&file.key)
                    .build()
                    .map_err(|error| format!("invalid source file {}: {error}", file.key))
            })
            .collect::<Result<Vec<_>, String>>()?;
        let error_report_location = sitewise::ErrorReportLocation::builder()
            .bucket(&request.error_report_location.bucket)
            .prefix(&request.error_report_location.prefix)
            .build()
            .map_err(|error| format!("invalid error report location: {error}"))?;
        let csv = sitewise::Csv::builder()
            .set_column_names(Some(
                request
                    .column_names
                    .iter()
                    .map(|column| sitewise::ColumnName::from(column.as_str()))
                    .collect(),
            ))
            .build()
            .finish("csv format")?;
        let job_configuration = sitewise::JobConfiguration::builder()
            .file_format(sitewise::FileFormat::builder().csv(csv).build())
            .build()
            .finish("job configuration")?;

        let output = block_on(
            self.client
                .create_bulk_import_job()
                .job_name(&request.job_name)
                .job_role_arn(&request.job_role_arn)
                .set_files(Some(files))
                .error_report_location(error_report_location)
                .job_configuration(job_configuration)
                .send(),
        )
        .map_err(|error| sdk_error("CreateBulkImportJob", error))?;
        required(present::<str>(output.job_id()), "CreateBulkImportJob", "jobId")
    }

    fn list_bulk_import_jobs(&self) -> Result<Vec<JobSummary>, String> {
        collect_pages(|token| {
            let output = block_on(
                self.client
                    .list_bulk_import_jobs()
                    .max_results(JOB_LIST_PAGE_SIZE)
                    .set_next_token(token)
                    .send(),
            )
            .map_err(|error| sdk_error("ListBulkImportJobs", error))?;
            let page = present::<[sitewise::JobSummary]>(output.job_summaries())
                .unwrap_or_default()
                .iter()
                .map(|summary| {
                    Ok(JobSummary {
                        id: required(present::<str>(summary.id()), "ListBulkImportJobs", "id")?,
                        name: required(
                            present::<str>(summary.name()),
                            "ListBulkImportJobs",
                            "name",
                        )?,
                        status: present::<sitewise::JobStatus>(summary.status())
                            .map(|status| status.as_str().to_string())
                            .unwrap_or_default(),
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            Ok((page, output.next_token().map(str::to_string)))
        })
    }
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), String> {
        block_on(async {
            let body = ByteStream::from_path(path)
                .await
                .map_err(|error| format!("failed to read {}: {error}", path.display()))?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| sdk_error("PutObject", error))
        })
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, String> {
        collect_pages(|token| {
            let output = block_on(
                self.client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(token)
                    .send(),
            )
            .map_err(|error| sdk_error("ListObjectsV2", error))?;
            let page = output
                .contents()
                .iter()
                .filter_map(|object| object.key().map(str::to_string))
                .collect();
            Ok((page, output.next_continuation_token().map(str::to_string)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_pages_follows_tokens_until_exhausted() {
        let mut calls = Vec::new();
        let items = collect_pages(|token| {
            calls.push(token.clone());
            match token.as_deref() {
                None => Ok((vec![1, 2], Some("page-2".to_string()))),
                Some("page-2") => Ok((vec![3], Some(String::new()))),
                Some(other) => Err(format!("unexpected token {other}")),
            }
        })
        .expect("pagination should succeed");

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls, vec![None, Some("page-2".to_string())]);
    }

    #[test]
    fn required_reports_missing_field() {
        let error = required::<str>(None, "CreateAsset", "assetId").expect_err("should fail");
        assert_eq!(error, "CreateAsset response is missing assetId");
        assert_eq!(
            required(Some("abc"), "CreateAsset", "assetId").unwrap(),
            "abc"
        );
    }

    #[test]
    fn measurement_schema_converts_to_sdk_definition() {
        let definition: PropertyDefinition = serde_json::from_str(
            r#"{"name": "Temperature", "dataType": "DOUBLE", "unit": "C", "type": {"measurement": {}}}"#,
        )
        .unwrap();
        let converted = property_definition(&definition).expect("conversion should succeed");
        assert_eq!(present::<str>(converted.name()), Some("Temperature"));
        assert_eq!(
            present::<sitewise::PropertyDataType>(converted.data_type()),
            Some(&sitewise::PropertyDataType::Double)
        );
    }

    #[test]
    fn attribute_schema_converts_to_update_property() {
        let definition: PropertyDefinition = serde_json::from_str(
            r#"{"name": "Serial", "dataType": "STRING", "type": {"attribute": {"defaultValue": "n/a"}}}"#,
        )
        .unwrap();
        let converted = update_property(&definition).expect("conversion should succeed");
        assert_eq!(present::<str>(converted.name()), Some("Serial"));
        assert_eq!(
            present::<sitewise::PropertyDataType>(converted.data_type()),
            Some(&sitewise::PropertyDataType::String)
        );
        assert!(present::<str>(converted.id()).is_none());
        let default_value = present::<sitewise::PropertyType>(converted.r#type())
            .and_then(|property_type| property_type.attribute())
            .and_then(|attribute| attribute.default_value());
        assert_eq!(default_value, Some("n/a"));
    }

    #[test]
    fn hierarchy_definition_converts_to_update_hierarchy() {
        let converted = update_hierarchy(&HierarchyDefinition {
            name: "Sample_Stamping Press".to_string(),
            child_asset_model_id: "model-2".to_string(),
        })
        .expect("conversion should succeed");
        assert_eq!(present::<str>(converted.name()), Some("Sample_Stamping Press"));
        assert_eq!(present::<str>(converted.child_asset_model_id()), Some("model-2"));
        assert!(present::<str>(converted.id()).is_none());
    }
}
