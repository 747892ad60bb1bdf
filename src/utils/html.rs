// src/utils/html.rs

/// Strips unsafe markup from teacher-authored text (paper titles,
/// questions, options, video titles) with ammonia's whitelist.
///
/// Safe tags such as `<b>` survive; `<script>` is removed together with its
/// content. Bare `<`, `>` and `&` come back as entities, so comparisons
/// must run on text cleaned the same way.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
