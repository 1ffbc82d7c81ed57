/*!
 * # Markup Core Module
 *
 * Everything in this module operates on two parallel coordinate spaces over
 * the same logical text:
 *
 * - the **markup** string: the persisted value, with each mention encoded as
 *   a template-generated token such as `@[alice](42)`
 * - the **plain** string: the editable rendering, with each token replaced by
 *   its display text
 *
 * ## Module Structure
 *
 * - **`template`**: compiles a markup template (`@[__display__](__id__)`)
 *   into a matcher/generator pair used symmetrically for parsing and
 *   generation
 * - **`mentions`**: scans a markup string into an ordered, non-overlapping
 *   [`MentionIndex`](mentions::MentionIndex) carrying both coordinate spaces,
 *   and renders the plain string
 * - **`position`**: maps offsets between the two spaces; positions strictly
 *   inside a mention's display span are not representable in markup
 *   coordinates and snap to a token edge by [`Bias`](position::Bias)
 * - **`change`**: reconstructs a new markup string from an observed
 *   plain-text edit, widening any deletion that partially touches a mention
 *   so tokens are removed atomically
 *
 * All functions here are pure and synchronous: they take immutable input
 * strings plus a reusable compiled [`Template`](template::Template) and are
 * safe to call concurrently with no shared state.
 */

pub mod change;
pub mod mentions;
pub mod position;
pub mod template;

pub use change::{apply_change, insert_mention};
pub use mentions::{DisplayTransform, Mention, MentionIndex, display_unchanged, plain_text};
pub use position::Bias;
pub use template::{Template, TemplateError};
