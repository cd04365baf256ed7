//! Module reference to JavaScript parameter name derivation.

/// Marker separating a loader plugin suffix (`domReady!`, `css!theme`).
pub const PLUGIN_MARKER: char = '!';

const MINIFIED_MARKER: &str = ".min";

/// Returns whether `reference` should be bound to a callback parameter.
///
/// Plugin references (anything carrying `!`) are loaded but never bound.
pub fn is_bindable(reference: &str) -> bool {
    !reference.contains(PLUGIN_MARKER)
}

/// Derives the callback parameter name for one module reference.
///
/// Steps, in order: keep the last path segment, drop `.min`, drop any
/// remaining extension, drop hyphens.
pub fn parameter_name(reference: &str) -> String {
    let segment = match reference.rfind('/') {
        Some(index) => &reference[index + 1..],
        None => reference,
    };

    let unminified = segment.replace(MINIFIED_MARKER, "");

    let stem = match unminified.rfind('.') {
        Some(index) => &unminified[..index],
        None => unminified.as_str(),
    };

    stem.replace('-', "")
}

#[cfg(test)]
mod tests {
    use super::{is_bindable, parameter_name};

    #[test]
    fn plain_reference_is_unchanged() {
        assert_eq!(parameter_name("jquery"), "jquery");
    }

    #[test]
    fn keeps_last_path_segment() {
        assert_eq!(parameter_name("etdsolutions/text"), "text");
        assert_eq!(parameter_name("js/vendor/moment"), "moment");
    }

    #[test]
    fn strips_minified_marker_and_extension() {
        assert_eq!(parameter_name("js/vendor/select2.min.js"), "select2");
        assert_eq!(parameter_name("vendor/bootstrap.min"), "bootstrap");
        assert_eq!(parameter_name("lib/chart.js"), "chart");
    }

    #[test]
    fn removes_hyphens() {
        assert_eq!(parameter_name("jquery-ui"), "jqueryui");
        assert_eq!(parameter_name("vendor/date-picker.min.js"), "datepicker");
    }

    #[test]
    fn plugin_references_are_not_bindable() {
        assert!(!is_bindable("domReady!"));
        assert!(!is_bindable("css!theme/main"));
        assert!(is_bindable("jquery"));
    }
}
