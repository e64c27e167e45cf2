//! JavaScript framework fingerprinting
//!
//! Two detection mechanisms exist and may disagree:
//! - static: substring markers in the lower-cased HTML
//! - live: sentinel globals evaluated inside a rendered page
//!
//! Live probes see state created by scripts at runtime, which markers in
//! the served HTML cannot.

/// Marker strings per framework, matched against lower-cased HTML
///
/// Order here is the order of `js_framework_hints` in the report.
pub const STATIC_MARKERS: &[(&str, &[&str])] = &[
    ("React", &["react.js", "react.min.js", "react-dom", "__react_"]),
    ("Vue", &["vue.js", "vue.min.js", "__vue__"]),
    ("Angular", &["angular.js", "angular.min.js", "ng-app", "ng-controller"]),
    ("jQuery", &["jquery.js", "jquery.min.js", "jquery"]),
    ("Bootstrap", &["bootstrap.js", "bootstrap.min.js", "bootstrap.css"]),
    ("Next.js", &["_next/", "__next_data__"]),
    ("Nuxt", &["_nuxt/"]),
];

/// Sentinel expressions evaluated in the rendered page's global scope
pub const LIVE_PROBES: &[(&str, &str)] = &[
    ("React", "!!(window.React || window.__REACT_DEVTOOLS_GLOBAL_HOOK__ || document.querySelector('[data-reactroot]'))"),
    ("Vue", "!!(window.Vue || window.__VUE__)"),
    ("Angular", "!!(window.angular || window.getAllAngularRootElements || window.ng)"),
    ("jQuery", "!!(window.jQuery || (window.$ && window.$.fn && window.$.fn.jquery))"),
    ("Next.js", "!!(window.__NEXT_DATA__ || window.next)"),
    ("Nuxt", "!!(window.__NUXT__ || window.$nuxt)"),
];

/// Detects frameworks from markers in raw HTML
pub fn detect_static(html: &str) -> Vec<String> {
    let lowered = html.to_lowercase();

    STATIC_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| lowered.contains(marker)))
        .map(|(name, _)| name.to_string())
        .collect()
}
