//! Shared fixtures for integration tests.

#![allow(dead_code)]

use gaarf::macros::{FixedClock, MacroMap, MacroValue};
use gaarf::schema::Schema;

/// A trimmed-down reporting API schema.
///
/// - `campaign`, `ad_group`, `ad_group_ad` are resources; `metrics` and
///   `segments` are common types exposed as top-level resources.
/// - `metrics.clicks` is repeated, `campaign.labels` uses the protobuf
///   `rule` form.
/// - `campaign.network_settings` refers to a nested type by short name,
///   `ad_group_ad.ad` refers to a resource by short name.
pub const SCHEMA_JSON: &str = r#"{
    "namespace": "google.ads.googleads.v14",
    "row": {
        "campaign":    { "type": "google.ads.googleads.v14.resources.Campaign" },
        "ad_group":    { "type": "google.ads.googleads.v14.resources.AdGroup" },
        "ad_group_ad": { "type": "google.ads.googleads.v14.resources.AdGroupAd" },
        "metrics":     { "type": "google.ads.googleads.v14.common.Metrics" },
        "segments":    { "type": "google.ads.googleads.v14.common.Segments" }
    },
    "resources": {
        "Campaign": {
            "fields": {
                "id":               { "type": "int64" },
                "name":             { "type": "string" },
                "resource_name":    { "type": "string" },
                "status":           { "type": "google.ads.googleads.v14.enums.CampaignStatusEnum.CampaignStatus" },
                "labels":           { "type": "string", "rule": "repeated" },
                "network_settings": { "type": "NetworkSettings" },
                "frequency_caps":   { "type": "google.ads.googleads.v14.common.FrequencyCapEntry", "repeated": true }
            },
            "nested": {
                "NetworkSettings": {
                    "fields": {
                        "target_search_network": { "type": "bool" },
                        "target_content_network": { "type": "bool" }
                    }
                }
            }
        },
        "AdGroup": {
            "fields": {
                "id":       { "type": "int64" },
                "name":     { "type": "string" },
                "campaign": { "type": "string" }
            }
        },
        "AdGroupAd": {
            "fields": {
                "ad":     { "type": "Ad" },
                "status": { "type": "google.ads.googleads.v14.enums.AdGroupAdStatusEnum.AdGroupAdStatus" }
            }
        },
        "Ad": {
            "fields": {
                "id":         { "type": "int64" },
                "type":       { "type": "google.ads.googleads.v14.enums.AdTypeEnum.AdType" },
                "final_urls": { "type": "string", "repeated": true },
                "text_ad":    { "type": "TextAdInfo" }
            }
        }
    },
    "common": {
        "Metrics": {
            "fields": {
                "clicks":      { "type": "int64", "repeated": true },
                "impressions": { "type": "int64" },
                "cost_micros": { "type": "int64" },
                "ctr":         { "type": "double" }
            }
        },
        "Segments": {
            "fields": {
                "date":   { "type": "string" },
                "device": { "type": "google.ads.googleads.v14.enums.DeviceEnum.Device" }
            }
        },
        "FrequencyCapEntry": {
            "fields": {
                "cap": { "type": "int32" },
                "key": { "type": "FrequencyCapKey" }
            }
        },
        "FrequencyCapKey": {
            "fields": {
                "level": { "type": "string" }
            }
        },
        "TextAdInfo": {
            "fields": {
                "headline":     { "type": "string" },
                "descriptions": { "type": "AdTextAsset", "repeated": true }
            }
        },
        "AdTextAsset": {
            "fields": {
                "text": { "type": "string" }
            }
        }
    },
    "enums": {
        "CampaignStatusEnum":  { "CampaignStatus":  { "values": ["UNSPECIFIED", "UNKNOWN", "ENABLED", "PAUSED", "REMOVED"] } },
        "AdGroupAdStatusEnum": { "AdGroupAdStatus": { "values": ["UNSPECIFIED", "UNKNOWN", "ENABLED", "PAUSED", "REMOVED"] } },
        "AdTypeEnum":          { "AdType":          { "values": ["UNSPECIFIED", "UNKNOWN", "TEXT_AD", "RESPONSIVE_SEARCH_AD"] } },
        "DeviceEnum":          { "Device":          { "values": ["UNSPECIFIED", "UNKNOWN", "MOBILE", "TABLET", "DESKTOP"] } }
    }
}"#;

pub fn schema() -> Schema {
    Schema::from_json_str(SCHEMA_JSON).unwrap()
}

/// 2024-03-15 10:30:00.
pub fn clock() -> FixedClock {
    let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    FixedClock::new(now)
}

pub fn macros(pairs: &[(&str, &str)]) -> MacroMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), MacroValue::from(*v)))
        .collect()
}
