// # Service Tags Dataset
//
// Serde model of the published "Service Tags" JSON document.
//
// ## Format
//
// ```json
// {
//   "changeNumber": 312,
//   "cloud": "Public",
//   "values": [
//     {
//       "name": "AzureDevOps",
//       "id": "AzureDevOps",
//       "properties": {
//         "changeNumber": 7,
//         "region": "",
//         "systemService": "AzureDevOps",
//         "addressPrefixes": ["20.37.158.0/23", "2603:1030:7::/48"]
//       }
//     }
//   ]
// }
// ```
//
// Only `values[].name` and `values[].properties.addressPrefixes` are
// consumed; every other field is optional.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::range::RangeBlock;

/// Top-level Service Tags document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTagsDocument {
    /// Document revision
    #[serde(default)]
    pub change_number: Option<u64>,
    /// Cloud name (e.g. "Public")
    #[serde(default)]
    pub cloud: Option<String>,
    /// Named ranges
    pub values: Vec<ServiceTag>,
}

/// One named range in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTag {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    pub properties: ServiceTagProperties,
}

/// Properties of a named range
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTagProperties {
    #[serde(default)]
    pub change_number: Option<u64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<u64>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub system_service: Option<String>,
    #[serde(default)]
    pub address_prefixes: Vec<String>,
    #[serde(default)]
    pub network_features: Option<Vec<String>>,
}

impl From<ServiceTag> for RangeBlock {
    fn from(tag: ServiceTag) -> Self {
        RangeBlock {
            name: tag.name,
            address_prefixes: tag.properties.address_prefixes,
        }
    }
}

impl ServiceTagsDocument {
    /// Convert into range blocks, keeping document order
    pub fn into_blocks(self) -> Vec<RangeBlock> {
        self.values.into_iter().map(RangeBlock::from).collect()
    }
}

/// Parse a Service Tags document into range blocks
///
/// A malformed document is reported as a fetch error: the run must not
/// reconcile anything from it.
pub fn parse_service_tags(json: &str) -> Result<Vec<RangeBlock>> {
    let document: ServiceTagsDocument = serde_json::from_str(json)
        .map_err(|e| Error::fetch(format!("Malformed service tags document: {}", e)))?;

    tracing::debug!(
        "Parsed service tags document (change {:?}, cloud {:?}, {} ranges)",
        document.change_number,
        document.cloud,
        document.values.len()
    );

    Ok(document.into_blocks())
}
