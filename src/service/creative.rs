use crate::api::rest::{Filter, RestClient};
use crate::error::SeedError;
use crate::types::{
    CreativeFormatPatch, CreativeRefs, CreativeRow, LookupRow, LookupTable, NewCreative,
};
use tracing::{info, warn};

pub const CREATIVES_TABLE: &str = "creatives";

/// Id of the row with `code`, if present.
pub async fn lookup_id(
    client: &RestClient,
    table: LookupTable,
    code: &str,
) -> Result<Option<String>, SeedError> {
    let rows: Vec<LookupRow> = client
        .select(
            table.as_str(),
            &[Filter::eq("code", code), Filter::select("id,code")],
        )
        .await?;
    Ok(rows.into_iter().next().and_then(|row| row.id))
}

/// References used by the test creative. Missing codes stay `None`.
pub async fn resolve_test_refs(client: &RestClient) -> Result<CreativeRefs, SeedError> {
    let refs = CreativeRefs {
        format_id: lookup_id(client, LookupTable::Formats, "teaser").await?,
        type_id: lookup_id(client, LookupTable::Types, "gambling").await?,
        placement_id: lookup_id(client, LookupTable::Placements, "youtube_ads").await?,
        platform_id: lookup_id(client, LookupTable::Platforms, "youtube").await?,
    };
    if refs.format_id.is_none()
        || refs.type_id.is_none()
        || refs.placement_id.is_none()
        || refs.platform_id.is_none()
    {
        warn!(?refs, "some test creative references are unresolved");
    }
    Ok(refs)
}

pub async fn create_test_creative(client: &RestClient) -> Result<(), SeedError> {
    let refs = resolve_test_refs(client).await?;
    let creative = NewCreative::test_creative(refs);
    client.insert(CREATIVES_TABLE, &creative).await?;
    info!(title = %creative.title, "test creative created");
    Ok(())
}

/// Point the newest creative titled `title` at the format `format_code`.
pub async fn set_creative_format(
    client: &RestClient,
    title: &str,
    format_code: &str,
) -> Result<CreativeRow, SeedError> {
    let format_id = lookup_id(client, LookupTable::Formats, format_code)
        .await?
        .ok_or_else(|| SeedError::NotFound(format!("format `{format_code}`")))?;
    info!(format_code, %format_id, "format found");

    let creatives: Vec<CreativeRow> = client
        .select(
            CREATIVES_TABLE,
            &[
                Filter::eq("title", title),
                Filter::select("id,title,format_id"),
                Filter::order("created_at", true),
                Filter::limit(1),
            ],
        )
        .await?;
    let creative = creatives
        .into_iter()
        .next()
        .ok_or_else(|| SeedError::NotFound(format!("creative `{title}`")))?;
    info!(id = %creative.id, title, "creative found");

    client
        .update(
            CREATIVES_TABLE,
            &[Filter::eq("id", &creative.id)],
            &CreativeFormatPatch {
                format_id: &format_id,
            },
        )
        .await?;
    info!(id = %creative.id, %format_id, "creative format updated");

    Ok(CreativeRow {
        format_id: Some(format_id),
        ..creative
    })
}
