//! Layer merging and reference validation.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::{ResolveError, Result};
use crate::layer::{MergeMode, ThemeLayer};
use crate::token::{TokenValue, ValueKind};
use crate::vars::KnownVariables;

use super::adaptive::ColorMode;
use super::resolved::ResolvedTheme;

/// Resolves an ordered stack of layers into one flat token table.
///
/// This is the mode-less form: only unscoped layers apply, and every variable
/// reference must be declared for both light and dark mode. Use [`Resolver`]
/// to resolve for a specific mode.
///
/// # Example
///
/// ```rust
/// use tokenlayer::{resolve, KnownVariables, ThemeLayer, TokenDocument, TokenValue};
///
/// let base = TokenDocument::builder()
///     .token("colors.primary.DEFAULT", "hsl(var(--primary))")
///     .token("colors.primary.foreground", "#e0def4")
///     .build()
///     .unwrap();
/// let user = TokenDocument::builder()
///     .token("colors.primary.foreground", "#ffffff")
///     .build()
///     .unwrap();
///
/// let known = KnownVariables::new().declare("--primary");
/// let theme = resolve(&[base.into(), user.into()], &known).unwrap();
///
/// assert_eq!(theme.get("colors.primary.DEFAULT"), Some(&TokenValue::color_var("--primary")));
/// assert_eq!(theme.get("colors.primary.foreground"), Some(&TokenValue::literal("#ffffff")));
/// ```
pub fn resolve(layers: &[ThemeLayer], known: &KnownVariables) -> Result<ResolvedTheme> {
    resolve_layers(layers, known, None)
}

/// A reusable resolver configuration: the known variables and an optional
/// color mode.
///
/// `Resolver` holds no state between calls. The same resolver can resolve any
/// number of layer stacks, from any number of threads.
///
/// # Example
///
/// ```rust
/// use tokenlayer::{ColorMode, KnownVariables, Resolver, ThemeLayer, TokenDocument};
///
/// let base = ThemeLayer::new(
///     TokenDocument::builder().token("colors.text", "#575279").build().unwrap(),
/// );
/// let dark = ThemeLayer::new(
///     TokenDocument::builder().token("colors.text", "#e0def4").build().unwrap(),
/// )
/// .for_mode(ColorMode::Dark);
///
/// let resolver = Resolver::new(KnownVariables::new()).with_mode(ColorMode::Dark);
/// let theme = resolver.resolve(&[base, dark]).unwrap();
/// assert_eq!(theme.get("colors.text").unwrap().to_string(), "#e0def4");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    known: KnownVariables,
    mode: Option<ColorMode>,
}

impl Resolver {
    /// Creates a mode-less resolver validating against `known`.
    pub fn new(known: KnownVariables) -> Self {
        Self { known, mode: None }
    }

    /// Resolves for one color mode: layers scoped to it apply, and references
    /// only need to be declared for it.
    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn known(&self) -> &KnownVariables {
        &self.known
    }

    pub fn mode(&self) -> Option<ColorMode> {
        self.mode
    }

    /// Merges `layers` in order and validates the result.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Conflict`] when a layer puts a single token where an
    ///   earlier layer has a group, or the other way round
    /// - [`ResolveError::UnresolvedReference`] when a reference names a
    ///   variable that is not declared for the resolved mode(s)
    pub fn resolve(&self, layers: &[ThemeLayer]) -> Result<ResolvedTheme> {
        resolve_layers(layers, &self.known, self.mode)
    }
}

/// Accumulated merge state. Leaves remember which layer last set them.
#[derive(Debug, Clone)]
enum Node {
    Leaf { value: TokenValue, layer: usize },
    Group(BTreeMap<String, Node>),
}

impl Node {
    fn from_value(value: &TokenValue, layer: usize) -> Self {
        match value {
            TokenValue::Composite(children) => Node::Group(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), Node::from_value(child, layer)))
                    .collect(),
            ),
            scalar => Node::Leaf {
                value: scalar.clone(),
                layer,
            },
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            Node::Leaf { value, .. } => value.kind(),
            Node::Group(_) => ValueKind::Composite,
        }
    }

    fn has_tokens(&self) -> bool {
        match self {
            Node::Leaf { .. } => true,
            Node::Group(children) => children.values().any(Node::has_tokens),
        }
    }
}

/// Whether `value` is a token or a group holding at least one token.
fn defines_tokens(value: &TokenValue) -> bool {
    match value {
        TokenValue::Composite(members) => members.values().any(defines_tokens),
        _ => true,
    }
}

fn resolve_layers(
    layers: &[ThemeLayer],
    known: &KnownVariables,
    mode: Option<ColorMode>,
) -> Result<ResolvedTheme> {
    let mut state: BTreeMap<String, Node> = BTreeMap::new();

    for (index, layer) in layers.iter().enumerate() {
        if !layer.applies_to(mode) {
            debug!(
                layer = index,
                name = layer.name().unwrap_or("<unnamed>"),
                scope = ?layer.mode(),
                "skipping layer scoped to another mode"
            );
            continue;
        }
        debug!(
            layer = index,
            name = layer.name().unwrap_or("<unnamed>"),
            tokens = layer.document().len(),
            "applying layer"
        );
        apply_layer(&mut state, layer, index)?;
    }

    let mut flat = BTreeMap::new();
    for (key, node) in state {
        flatten(key, node, &mut flat);
    }

    let modes: &[ColorMode] = match &mode {
        Some(mode) => std::slice::from_ref(mode),
        None => &ColorMode::ALL,
    };
    validate(&flat, known, modes)?;

    Ok(ResolvedTheme::new(
        flat.into_iter().map(|(path, (value, _))| (path, value)).collect(),
        mode,
    ))
}

fn apply_layer(state: &mut BTreeMap<String, Node>, layer: &ThemeLayer, index: usize) -> Result<()> {
    for (category, value) in layer.document().categories() {
        match layer.merge_mode(category) {
            MergeMode::Replace => {
                if let Some(existing) = state.get(category) {
                    check_shape(existing, value, category, index)?;
                    trace!(layer = index, category, "replacing category");
                }
                state.insert(category.to_string(), Node::from_value(value, index));
            }
            MergeMode::Extend => merge_into(state, category, value, category, index)?,
        }
    }
    Ok(())
}

/// Checks that `incoming` has the same single-token/group shape as `existing`
/// wherever both define a path.
///
/// A group with no tokens in it defines nothing and never collides.
fn check_shape(existing: &Node, incoming: &TokenValue, path: &str, layer: usize) -> Result<()> {
    match (existing, incoming) {
        _ if !existing.has_tokens() || !defines_tokens(incoming) => Ok(()),
        (Node::Group(children), TokenValue::Composite(members)) => {
            for (key, member) in members {
                if let Some(child) = children.get(key) {
                    check_shape(child, member, &format!("{}.{}", path, key), layer)?;
                }
            }
            Ok(())
        }
        (Node::Leaf { .. }, value) if value.is_scalar() => Ok(()),
        (existing, incoming) => Err(conflict(path, layer, existing.kind(), incoming.kind())),
    }
}

fn merge_into(
    map: &mut BTreeMap<String, Node>,
    key: &str,
    incoming: &TokenValue,
    path: &str,
    layer: usize,
) -> Result<()> {
    match map.entry(key.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(Node::from_value(incoming, layer));
        }
        Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
            (Node::Group(children), TokenValue::Composite(members)) => {
                for (member_key, member) in members {
                    let member_path = format!("{}.{}", path, member_key);
                    merge_into(children, member_key, member, &member_path, layer)?;
                }
            }
            (Node::Leaf { value, layer: origin }, incoming) if incoming.is_scalar() => {
                if value != incoming {
                    trace!(layer, path, from = %value, to = %incoming, "shadowing token");
                    *value = incoming.clone();
                    *origin = layer;
                }
            }
            // Empty groups define nothing: they give way and are ignored.
            (existing, incoming) if !existing.has_tokens() => {
                *existing = Node::from_value(incoming, layer);
            }
            (_, incoming) if !defines_tokens(incoming) => {}
            (existing, incoming) => {
                return Err(conflict(path, layer, existing.kind(), incoming.kind()));
            }
        },
    }
    Ok(())
}

fn conflict(path: &str, layer: usize, existing: ValueKind, incoming: ValueKind) -> ResolveError {
    ResolveError::Conflict {
        path: path.to_string(),
        layer,
        existing,
        incoming,
    }
}

fn flatten(path: String, node: Node, out: &mut BTreeMap<String, (TokenValue, usize)>) {
    match node {
        Node::Leaf { value, layer } => {
            out.insert(path, (value, layer));
        }
        Node::Group(children) => {
            for (key, child) in children {
                flatten(format!("{}.{}", path, key), child, out);
            }
        }
    }
}

fn validate(
    flat: &BTreeMap<String, (TokenValue, usize)>,
    known: &KnownVariables,
    modes: &[ColorMode],
) -> Result<()> {
    for (path, (value, layer)) in flat {
        for reference in value.references() {
            for &mode in modes {
                if !known.contains(mode, reference) {
                    return Err(ResolveError::UnresolvedReference {
                        path: path.clone(),
                        reference: reference.to_string(),
                        layer: *layer,
                        mode,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenDocument;

    fn layer(entries: &[(&str, TokenValue)]) -> ThemeLayer {
        let mut builder = TokenDocument::builder();
        for (path, value) in entries {
            builder.push(*path, value.clone());
        }
        ThemeLayer::new(builder.build().unwrap())
    }

    fn lit(s: &str) -> TokenValue {
        TokenValue::literal(s)
    }

    fn none() -> KnownVariables {
        KnownVariables::new()
    }

    // =========================================================================
    // Extend
    // =========================================================================

    #[test]
    fn test_extend_shadows_same_path() {
        let theme = resolve(
            &[
                layer(&[("colors.gold", lit("#f6c177"))]),
                layer(&[("colors.gold", lit("#ffbf5a"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("colors.gold"), Some(&lit("#ffbf5a")));
    }

    #[test]
    fn test_extend_keeps_absent_keys() {
        let theme = resolve(
            &[
                layer(&[("colors.gold", lit("#f6c177")), ("colors.rose", lit("#ebbcba"))]),
                layer(&[("colors.gold", lit("#ffbf5a"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("colors.rose"), Some(&lit("#ebbcba")));
        assert_eq!(theme.len(), 2);
    }

    #[test]
    fn test_extend_recurses_into_groups() {
        let theme = resolve(
            &[
                layer(&[
                    ("primary.DEFAULT", lit("x")),
                    ("primary.foreground", lit("y")),
                ]),
                layer(&[("primary.foreground", lit("z"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("primary.DEFAULT"), Some(&lit("x")));
        assert_eq!(theme.get("primary.foreground"), Some(&lit("z")));
    }

    #[test]
    fn test_literal_shadowed_by_reference() {
        let known = KnownVariables::new().declare("--border");
        let theme = resolve(
            &[
                layer(&[("colors.border", lit("#524f67"))]),
                layer(&[("colors.border", TokenValue::color_var("--border"))]),
            ],
            &known,
        )
        .unwrap();
        assert_eq!(
            theme.get("colors.border"),
            Some(&TokenValue::color_var("--border"))
        );
    }

    #[test]
    fn test_same_value_redefinition_is_noop() {
        let theme = resolve(
            &[
                layer(&[("colors.gold", lit("#f6c177"))]),
                layer(&[("colors.gold", lit("#f6c177"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("colors.gold"), Some(&lit("#f6c177")));
    }

    #[test]
    fn test_extend_scalar_onto_group_conflicts() {
        let err = resolve(
            &[
                layer(&[("colors.muted.DEFAULT", lit("#6e6a86"))]),
                layer(&[("colors.muted", lit("#908caa"))]),
            ],
            &none(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::Conflict {
                path: "colors.muted".into(),
                layer: 1,
                existing: ValueKind::Composite,
                incoming: ValueKind::Literal,
            }
        );
    }

    #[test]
    fn test_extend_group_onto_scalar_conflicts() {
        let err = resolve(
            &[
                layer(&[("colors.text", lit("#e0def4"))]),
                layer(&[("colors.text.DEFAULT", lit("#e0def4"))]),
            ],
            &none(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Conflict { existing: ValueKind::Literal, incoming: ValueKind::Composite, .. }
        ));
    }

    // =========================================================================
    // Replace
    // =========================================================================

    #[test]
    fn test_replace_discards_category() {
        let base = layer(&[("colors.a", lit("1")), ("colors.b", lit("2")), ("spacing.x", lit("4px"))]);
        let over = layer(&[("colors.c", lit("3"))]).replace("colors");
        let theme = resolve(&[base, over], &none()).unwrap();

        let colors: Vec<&str> = theme.category("colors").map(|(path, _)| path).collect();
        assert_eq!(colors, vec!["colors.c"]);
        assert_eq!(theme.get("spacing.x"), Some(&lit("4px")));
    }

    #[test]
    fn test_replace_with_empty_group_clears_category() {
        let base = layer(&[("colors.a", lit("1"))]);
        let over = layer(&[("colors", TokenValue::group(Vec::<(String, TokenValue)>::new()))])
            .replace("colors");
        let theme = resolve(&[base, over], &none()).unwrap();
        assert!(theme.is_empty());
    }

    #[test]
    fn test_replace_annotation_without_category_is_noop() {
        let base = layer(&[("colors.a", lit("1"))]);
        let over = layer(&[("spacing.x", lit("4px"))]).replace("colors");
        let theme = resolve(&[base, over], &none()).unwrap();
        assert_eq!(theme.get("colors.a"), Some(&lit("1")));
    }

    #[test]
    fn test_replace_kind_collision_conflicts() {
        let first = layer(&[("colors.text", lit("#e0def4"))]).replace("colors");
        let second = layer(&[("colors.text.DEFAULT", lit("#e0def4"))]).replace("colors");
        let err = resolve(&[first, second], &none()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Conflict {
                path: "colors.text".into(),
                layer: 1,
                existing: ValueKind::Literal,
                incoming: ValueKind::Composite,
            }
        );
    }

    #[test]
    fn test_replace_scalar_category_with_scalar() {
        let known = KnownVariables::new().declare("--border");
        let first = layer(&[("border", lit("#524f67"))]);
        let second = layer(&[("border", TokenValue::var("--border"))]).replace("border");
        let theme = resolve(&[first, second], &known).unwrap();
        assert_eq!(theme.get("border"), Some(&TokenValue::var("--border")));
    }

    // =========================================================================
    // Empty groups
    // =========================================================================

    fn empty() -> TokenValue {
        TokenValue::group(Vec::<(String, TokenValue)>::new())
    }

    #[test]
    fn test_token_onto_empty_group() {
        let a = layer(&[("colors.primary", empty())]);
        let b = layer(&[("spacing.x", lit("1px"))]);
        let c = layer(&[("colors.primary", lit("#fff"))]);

        let all = resolve(&[a.clone(), b.clone(), c.clone()], &none()).unwrap();
        let prefix = resolve(&[a, b], &none()).unwrap();
        let chained = resolve(&[prefix.to_layer(), c], &none()).unwrap();

        assert_eq!(all.get("colors.primary"), Some(&lit("#fff")));
        assert_eq!(all, chained);
    }

    #[test]
    fn test_empty_group_onto_token_is_ignored() {
        let theme = resolve(
            &[
                layer(&[("colors.primary", lit("#fff"))]),
                layer(&[("colors.primary", empty())]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("colors.primary"), Some(&lit("#fff")));
        assert_eq!(theme.len(), 1);
    }

    #[test]
    fn test_nested_empty_groups_define_nothing() {
        let hollow = TokenValue::group([("DEFAULT", empty())]);
        let theme = resolve(
            &[
                layer(&[("colors.muted", hollow)]),
                layer(&[("colors.muted", lit("#6e6a86"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("colors.muted"), Some(&lit("#6e6a86")));
    }

    #[test]
    fn test_replace_checks_skip_empty_groups() {
        let first = layer(&[("colors.text", empty())]).replace("colors");
        let second = layer(&[("colors.text", lit("#e0def4"))]).replace("colors");
        let theme = resolve(&[first, second], &none()).unwrap();
        assert_eq!(theme.get("colors.text"), Some(&lit("#e0def4")));
    }

    // =========================================================================
    // Modes and validation
    // =========================================================================

    #[test]
    fn test_scoped_layers_follow_mode() {
        let base = layer(&[("colors.text", lit("#575279"))]);
        let dark = layer(&[("colors.text", lit("#e0def4"))]).for_mode(ColorMode::Dark);
        let layers = [base, dark];

        let unscoped = resolve(&layers, &none()).unwrap();
        assert_eq!(unscoped.get("colors.text"), Some(&lit("#575279")));
        assert_eq!(unscoped.mode(), None);

        let light = Resolver::new(none())
            .with_mode(ColorMode::Light)
            .resolve(&layers)
            .unwrap();
        assert_eq!(light.get("colors.text"), Some(&lit("#575279")));

        let dark = Resolver::new(none())
            .with_mode(ColorMode::Dark)
            .resolve(&layers)
            .unwrap();
        assert_eq!(dark.get("colors.text"), Some(&lit("#e0def4")));
        assert_eq!(dark.mode(), Some(ColorMode::Dark));
    }

    #[test]
    fn test_unresolved_reference() {
        let err = resolve(&[layer(&[("border", TokenValue::var("--border"))])], &none())
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedReference {
                path: "border".into(),
                reference: "--border".into(),
                layer: 0,
                mode: ColorMode::Light,
            }
        );
    }

    #[test]
    fn test_reference_missing_in_one_mode() {
        let known = KnownVariables::new().declare_for(ColorMode::Light, "--glow");
        let layers = [layer(&[("boxShadow.glow", TokenValue::var("--glow"))])];

        assert!(Resolver::new(known.clone())
            .with_mode(ColorMode::Light)
            .resolve(&layers)
            .is_ok());

        let err = resolve(&layers, &known).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnresolvedReference { mode: ColorMode::Dark, .. }
        ));
    }

    #[test]
    fn test_embedded_reference_validated() {
        let err = resolve(
            &[layer(&[("borderRadius.xl", lit("calc(var(--radius) + 4px)"))])],
            &none(),
        )
        .unwrap_err();
        assert_eq!(err.path(), "borderRadius.xl");
    }

    #[test]
    fn test_unresolved_reference_reports_supplying_layer() {
        let known = KnownVariables::new().declare("--ring");
        let err = resolve(
            &[
                layer(&[("ring", TokenValue::color_var("--ring"))]),
                layer(&[("input", TokenValue::color_var("--input"))]),
            ],
            &known,
        )
        .unwrap_err();
        assert_eq!(err.layer(), Some(1));
    }

    #[test]
    fn test_shadowed_reference_not_validated() {
        // Only the final value of a path needs its references declared.
        let theme = resolve(
            &[
                layer(&[("ring", TokenValue::color_var("--ring"))]),
                layer(&[("ring", lit("#c4a7e7"))]),
            ],
            &none(),
        )
        .unwrap();
        assert_eq!(theme.get("ring"), Some(&lit("#c4a7e7")));
    }

    #[test]
    fn test_no_layers() {
        let theme = resolve(&[], &none()).unwrap();
        assert!(theme.is_empty());
    }
}
