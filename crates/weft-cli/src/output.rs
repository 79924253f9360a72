//! The JSON document printed on stdout.

use std::cmp::Ordering;

use serde::Serialize;
use weft_core::{DocumentUrl, Feature, FeatureKind, SourceRange, Warning};

/// Version of the output format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Package metadata, grouped by feature kind.
///
/// Each list is sorted by file, then position, with duplicates removed: the
/// same feature is reached once per entry point that imports it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata<'a> {
    pub schema_version: &'static str,
    pub elements: Vec<&'a Feature>,
    pub mixins: Vec<&'a Feature>,
    pub behaviors: Vec<&'a Feature>,
    pub namespaces: Vec<&'a Feature>,
    pub warnings: Vec<&'a Warning>,
}

impl<'a> Metadata<'a> {
    /// Group `features` and `warnings`, dropping anything that lives under
    /// one of `filter_dirs`.
    pub fn collect(
        features: impl IntoIterator<Item = &'a Feature>,
        warnings: impl IntoIterator<Item = &'a Warning>,
        filter_dirs: &[String],
    ) -> Self {
        let mut metadata = Self {
            schema_version: SCHEMA_VERSION,
            elements: Vec::new(),
            mixins: Vec::new(),
            behaviors: Vec::new(),
            namespaces: Vec::new(),
            warnings: Vec::new(),
        };

        for feature in features {
            if is_filtered(feature.file(), filter_dirs) {
                continue;
            }
            let list = match feature.kind() {
                FeatureKind::Element => &mut metadata.elements,
                FeatureKind::ElementMixin => &mut metadata.mixins,
                FeatureKind::Behavior => &mut metadata.behaviors,
                FeatureKind::Namespace => &mut metadata.namespaces,
                FeatureKind::Import | FeatureKind::Generic => continue,
            };
            list.push(feature);
        }
        metadata.warnings = warnings
            .into_iter()
            .filter(|warning| !is_filtered(&warning.source_range.file, filter_dirs))
            .collect();

        for list in [
            &mut metadata.elements,
            &mut metadata.mixins,
            &mut metadata.behaviors,
            &mut metadata.namespaces,
        ] {
            sort_unique(list, |feature| &feature.source_range);
        }
        sort_unique(&mut metadata.warnings, |warning| &warning.source_range);
        metadata
    }

    pub fn feature_count(&self) -> usize {
        self.elements.len() + self.mixins.len() + self.behaviors.len() + self.namespaces.len()
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn is_filtered(url: &DocumentUrl, filter_dirs: &[String]) -> bool {
    url.segments()
        .any(|segment| filter_dirs.iter().any(|dir| dir == segment))
}

fn compare_ranges(a: &SourceRange, b: &SourceRange) -> Ordering {
    a.file
        .cmp(&b.file)
        .then(a.start.cmp(&b.start))
        .then(a.end.cmp(&b.end))
}

fn sort_unique<T: PartialEq>(items: &mut Vec<&T>, range: impl Fn(&T) -> &SourceRange) {
    items.sort_by(|a, b| compare_ranges(range(*a), range(*b)));

    // Equal items share a range, so only the run with the same range is checked.
    let mut unique: Vec<&T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        let duplicate = unique
            .iter()
            .rev()
            .copied()
            .take_while(|kept| range(*kept) == range(item))
            .any(|kept| kept == item);
        if !duplicate {
            unique.push(item);
        }
    }
    *items = unique;
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{ElementData, FeatureData, MixinData, Position, WarningCode};

    fn range(file: &str, line: u32) -> SourceRange {
        SourceRange::new(
            DocumentUrl::new(file).unwrap(),
            Position::new(line, 0),
            Position::new(line, 10),
        )
    }

    fn element(file: &str, line: u32, tag: &str) -> Feature {
        Feature::new(range(file, line), FeatureData::Element(ElementData::default()))
            .with_identifiers([tag])
    }

    fn filters() -> Vec<String> {
        vec!["test".to_string(), "demo".to_string()]
    }

    fn identifiers<'a>(features: &[&'a Feature]) -> Vec<&'a str> {
        features
            .iter()
            .map(|feature| feature.identifiers[0].as_str())
            .collect()
    }

    #[test]
    fn test_groups_by_kind() {
        let features = [
            element("a.js", 0, "x-a"),
            Feature::new(range("a.js", 5), FeatureData::ElementMixin(MixinData::default()))
                .with_identifiers(["MyMixin"]),
        ];
        let metadata = Metadata::collect(&features, [], &filters());
        assert_eq!(identifiers(&metadata.elements), ["x-a"]);
        assert_eq!(identifiers(&metadata.mixins), ["MyMixin"]);
        assert!(metadata.behaviors.is_empty());
        assert_eq!(metadata.feature_count(), 2);
    }

    #[test]
    fn test_sorts_by_file_then_position() {
        let features = [
            element("b.js", 0, "x-b"),
            element("a.js", 9, "x-a2"),
            element("a.js", 1, "x-a1"),
        ];
        let metadata = Metadata::collect(&features, [], &filters());
        assert_eq!(identifiers(&metadata.elements), ["x-a1", "x-a2", "x-b"]);
    }

    #[test]
    fn test_removes_duplicates() {
        let features = [
            element("a.js", 0, "x-a"),
            element("b.js", 0, "x-b"),
            element("a.js", 0, "x-a"),
            element("a.js", 0, "x-other"),
        ];
        let metadata = Metadata::collect(&features, [], &filters());
        assert_eq!(identifiers(&metadata.elements), ["x-a", "x-other", "x-b"]);
    }

    #[test]
    fn test_filters_directories() {
        let features = [
            element("src/x-a.js", 0, "x-a"),
            element("test/x-fixture.js", 0, "x-fixture"),
            element("src/demo/x-demo.js", 0, "x-demo"),
            element("src/testing/x-ok.js", 0, "x-ok"),
        ];
        let warnings = [
            Warning::warning(WarningCode::CouldNotResolve, "nope", range("test/a.js", 0)),
            Warning::warning(WarningCode::CouldNotResolve, "kept", range("src/a.js", 0)),
        ];
        let metadata = Metadata::collect(&features, &warnings, &filters());
        // "src/testing/..." sorts before "src/x-a.js".
        assert_eq!(identifiers(&metadata.elements), ["x-ok", "x-a"]);
        assert_eq!(metadata.warnings.len(), 1);
        assert_eq!(metadata.warnings[0].message, "kept");
    }

    #[test]
    fn test_json_shape() {
        let features = [element("a.js", 0, "x-a")];
        let metadata = Metadata::collect(&features, [], &[]);
        let json: serde_json::Value =
            serde_json::from_str(&metadata.to_json(false).unwrap()).unwrap();
        assert_eq!(json["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(json["elements"][0]["kind"], "element");
        assert_eq!(json["elements"][0]["identifiers"][0], "x-a");
        assert_eq!(json["elements"][0]["sourceRange"]["file"], "a.js");
        assert_eq!(json["warnings"], serde_json::json!([]));
        assert!(metadata.to_json(true).unwrap().contains('\n'));
    }
}
