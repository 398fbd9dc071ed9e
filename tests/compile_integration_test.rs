//! Integration tests for query compilation against a realistic schema.
//!
//! Covers column naming, customizers, type resolution across resources and
//! namespaces, and the error classification of every failure mode.

mod common;

use gaarf::query::{compile, CompileError, CompiledQuery, Customizer, ErrorKind, QueryParams};
use gaarf::schema::{FieldTypeKind, SchemaError};

fn compile_ok(query: &str) -> CompiledQuery {
    let schema = common::schema();
    let result = compile(query, &QueryParams::new(), &schema);
    assert!(result.is_ok(), "Query should compile: {:?}", result);
    result.unwrap()
}

fn compile_err(query: &str) -> CompileError {
    let schema = common::schema();
    match compile(query, &QueryParams::new(), &schema) {
        Ok(q) => panic!("Query should fail to compile, got columns {:?}", q.column_names()),
        Err(e) => e,
    }
}

fn summary(query: &CompiledQuery) -> String {
    query
        .columns()
        .map(|c| {
            let repeated = if c.field_type.repeated { " repeated" } else { "" };
            let customizer = match c.customizer {
                Some(Customizer::ResourceIndex(i)) => format!(" ~{}", i),
                Some(Customizer::NestedField(p)) => format!(" :{}", p),
                None => String::new(),
            };
            format!(
                "{}: {} {}{}{}",
                c.name, c.field_type.kind, c.field_type.type_name, repeated, customizer
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Column Naming
// ============================================================================

#[test]
fn test_end_to_end_example() {
    let query = compile_ok("SELECT campaign.id, campaign.name AS name, metrics.clicks~0 FROM campaign");

    insta::assert_snapshot!(summary(&query), @r"
    campaign.id: primitive int64
    name: primitive string
    metrics.clicks: primitive int64 repeated ~0
    ");

    assert_eq!(query.resource().name, "campaign");
    assert_eq!(query.resource().type_name, "Campaign");
    assert_eq!(query.customizers()[2], Some(Customizer::ResourceIndex(0)));
}

#[test]
fn test_alias_column_names_in_order() {
    let query = compile_ok("SELECT campaign.id AS a, campaign.name AS c FROM campaign");
    assert_eq!(query.column_names(), ["a", "c"]);

    let query = compile_ok("SELECT campaign.id, campaign.name AS c FROM campaign");
    assert_eq!(query.column_names(), ["campaign.id", "c"]);
}

#[test]
fn test_duplicate_column_name() {
    let err = compile_err("SELECT campaign.id AS x, campaign.name AS x FROM campaign");
    assert!(matches!(err, CompileError::DuplicateColumn { ref name, index: 1 } if name == "x"));
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);

    let err = compile_err("SELECT campaign.id, campaign.id FROM campaign");
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
}

#[test]
fn test_keywords_case_insensitive_and_comments() {
    let query = compile_ok(
        r#"
        # Campaign performance
        select
            campaign.id,      -- identifier
            metrics.impressions as impressions
        from campaign
        "#,
    );
    assert_eq!(query.column_names(), ["campaign.id", "impressions"]);
    assert_eq!(
        query.query_text(),
        "select campaign.id, metrics.impressions from campaign"
    );
}

// ============================================================================
// Type Resolution
// ============================================================================

#[test]
fn test_enum_and_nested_types() {
    let query = compile_ok(
        "SELECT campaign.status, \
                campaign.network_settings.target_search_network AS search, \
                ad_group_ad.ad.text_ad.headline AS headline, \
                ad_group_ad.ad.type AS ad_type \
         FROM ad_group_ad",
    );

    insta::assert_snapshot!(summary(&query), @r"
    campaign.status: enum CampaignStatus
    search: primitive bool
    headline: primitive string
    ad_type: enum AdType
    ");
}

#[test]
fn test_repeated_terminal_field() {
    let query = compile_ok(
        "SELECT campaign.labels, ad_group_ad.ad.final_urls AS urls, campaign.frequency_caps AS caps FROM campaign",
    );
    let types = query.column_types();
    assert!(types.iter().all(|t| t.repeated));
    assert_eq!(types[2].kind, FieldTypeKind::Struct);
    assert_eq!(types[2].type_name, "FrequencyCapEntry");
}

#[test]
fn test_repeated_in_middle_is_schema_error() {
    let err = compile_err("SELECT campaign.frequency_caps.cap FROM campaign");
    assert!(matches!(
        err,
        CompileError::Schema(SchemaError::RepeatedInMiddle { ref field, .. }) if field == "frequency_caps"
    ));
    assert_eq!(err.kind(), ErrorKind::SchemaResolution);
}

#[test]
fn test_non_terminal_primitive_and_enum() {
    let err = compile_err("SELECT campaign.id.value FROM campaign");
    assert!(matches!(err, CompileError::Schema(SchemaError::NonTerminalPrimitive { .. })));
    assert_eq!(err.kind(), ErrorKind::SchemaResolution);

    let err = compile_err("SELECT campaign.status.value FROM campaign");
    assert!(matches!(err, CompileError::Schema(SchemaError::NonTerminalEnum { .. })));
    assert_eq!(err.kind(), ErrorKind::SchemaResolution);
}

#[test]
fn test_unknown_field() {
    let err = compile_err("SELECT campaign.budget FROM campaign");
    assert!(matches!(
        err,
        CompileError::Schema(SchemaError::UnknownField { ref field, .. }) if field == "budget"
    ));
}

#[test]
fn test_unknown_resource_named_in_error() {
    let err = compile_err("SELECT campaign.id FROM unknownres");
    assert!(matches!(err, CompileError::Schema(SchemaError::UnknownResource(ref r)) if r == "unknownres"));
    assert_eq!(err.kind(), ErrorKind::SchemaResolution);
    assert!(err.to_string().contains("unknownres"));
}

// ============================================================================
// Customizers
// ============================================================================

#[test]
fn test_nested_field_customizer() {
    let query = compile_ok(
        "SELECT ad_group_ad.ad.text_ad:headline AS headline, \
                ad_group_ad.ad.text_ad.descriptions:text AS descriptions \
         FROM ad_group_ad",
    );

    insta::assert_snapshot!(summary(&query), @r"
    headline: primitive string :headline
    descriptions: primitive string repeated :text
    ");
    assert_eq!(
        query.query_text(),
        "SELECT ad_group_ad.ad.text_ad, ad_group_ad.ad.text_ad.descriptions FROM ad_group_ad"
    );
}

#[test]
fn test_nested_field_on_primitive_or_enum() {
    for query in [
        "SELECT campaign.name:value FROM campaign",
        "SELECT campaign.status:value FROM campaign",
        "SELECT metrics.clicks:value FROM campaign",
    ] {
        let err = compile_err(query);
        assert!(
            matches!(err, CompileError::NestedFieldOnScalar { .. }),
            "{}: {:?}",
            query,
            err
        );
        assert_eq!(err.kind(), ErrorKind::SchemaResolution);
    }
}

#[test]
fn test_resource_index_customizer() {
    let query = compile_ok("SELECT ad_group.campaign~0 AS campaign_id, ad_group.id FROM ad_group");
    assert_eq!(query.customizers()[0], Some(Customizer::ResourceIndex(0)));
    assert_eq!(query.customizers()[1], None);
    assert_eq!(query.column_types()[0].type_name, "string");

    let query = compile_ok("SELECT ad_group.campaign~-1 AS campaign_id FROM ad_group");
    assert_eq!(query.customizers()[0], Some(Customizer::ResourceIndex(-1)));
    assert_eq!(query.query_text(), "SELECT ad_group.campaign FROM ad_group");
}

#[test]
fn test_invalid_customizers() {
    let err = compile_err("SELECT ad_group.campaign~x FROM ad_group");
    assert!(matches!(err, CompileError::InvalidResourceIndex { .. }));
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);

    let err = compile_err("SELECT ad_group_ad.ad.text_ad: FROM ad_group_ad");
    assert!(matches!(err, CompileError::EmptyNestedPath { .. }));

    // `~` wins over `:` on the same expression.
    let err = compile_err("SELECT ad_group.campaign~1:name FROM ad_group");
    assert!(matches!(err, CompileError::InvalidResourceIndex { .. }));
}

// ============================================================================
// Syntax Errors and Parameters
// ============================================================================

#[test]
fn test_empty_select_field() {
    let err = compile_err("SELECT campaign.id, , campaign.name FROM campaign");
    assert!(matches!(err, CompileError::EmptySelectField { index: 1 }));
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
}

#[test]
fn test_missing_from() {
    let err = compile_err("SELECT campaign.id");
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
}

#[test]
fn test_strict_params() {
    let schema = common::schema();
    let query = "SELECT campaign.id FROM campaign WHERE segments.date BETWEEN '{start}' AND '{end}' AND campaign.name = '{start}'";

    let err = compile(query, &QueryParams::new(), &schema).unwrap_err();
    match err {
        CompileError::UnresolvedParams(names) => assert_eq!(names, ["start", "end"]),
        other => panic!("expected UnresolvedParams, got {:?}", other),
    }

    let params: QueryParams = [("start", "2024-01-01"), ("end", "2024-01-31")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let compiled = compile(query, &params, &schema).unwrap();
    assert!(compiled
        .query_text()
        .contains("BETWEEN '2024-01-01' AND '2024-01-31'"));
}

#[test]
fn test_normalization_is_noop_without_extensions() {
    let text = "SELECT campaign.id, metrics.clicks FROM campaign WHERE segments.date DURING LAST_7_DAYS";
    let query = compile_ok(text);
    assert_eq!(query.query_text(), text);
}

#[test]
fn test_json_serialization() {
    let query = compile_ok("SELECT campaign.id, metrics.clicks~0 AS clicks FROM campaign");
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["column_names"], serde_json::json!(["campaign.id", "clicks"]));
    assert_eq!(
        json["customizers"][1],
        serde_json::json!({"type": "resource_index", "value": 0})
    );
    assert_eq!(json["column_types"][0]["kind"], "primitive");
}
