use serde::{Deserialize, Serialize};

/// Foreign keys of a creative, resolved from lookup codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreativeRefs {
    pub format_id: Option<String>,
    pub type_id: Option<String>,
    pub placement_id: Option<String>,
    pub platform_id: Option<String>,
}

/// POST body for `creatives`. Unresolved references are sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCreative {
    pub title: String,
    pub description: Option<String>,
    pub format_id: Option<String>,
    pub type_id: Option<String>,
    pub placement_id: Option<String>,
    pub country_code: Option<String>,
    pub platform_id: Option<String>,
    pub cloaking: bool,
    pub media_url: Option<String>,
    pub landing_url: Option<String>,
    pub source_device: Option<String>,
}

impl NewCreative {
    pub fn test_creative(refs: CreativeRefs) -> Self {
        Self {
            title: "Test Casino Ad".to_string(),
            description: Some(
                "AHORA OFICIALMENTE EN LÍNEA - BONO DE BIENVENIDA DE 150.000".to_string(),
            ),
            format_id: refs.format_id,
            type_id: refs.type_id,
            placement_id: refs.placement_id,
            country_code: Some("AR".to_string()),
            platform_id: refs.platform_id,
            cloaking: true,
            media_url: Some("https://example.com/test-image.jpg".to_string()),
            landing_url: Some("https://example.com/casino".to_string()),
            source_device: Some("test-device".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreativeRow {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub format_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreativeFormatPatch<'a> {
    pub format_id: &'a str,
}
