//! Built-in scanners.

pub mod css;
pub mod html;
pub mod js;

use weft_core::{Feature, FeatureData, ImportFeature, ImportKind, ImportSyntax, SourceRange};

/// An unresolved import feature; the pipeline fills in `resolved_url`.
pub(crate) fn import_feature(
    range: SourceRange,
    specifier: impl Into<String>,
    import_kind: ImportKind,
    syntax: ImportSyntax,
) -> Feature {
    Feature::new(
        range,
        FeatureData::Import(ImportFeature {
            specifier: specifier.into(),
            resolved_url: None,
            import_kind,
            syntax,
        }),
    )
}
