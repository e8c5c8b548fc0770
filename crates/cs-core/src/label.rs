/// Canonical form used for label markers and label references: lowercase,
/// one leading `@` and one trailing `:`. `Foo`, `@foo`, `foo:` and `@Foo:`
/// all normalize to `@foo:`.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);
    format!("@{}:", trimmed.trim().to_lowercase())
}
