//! # m-editor — editor core for m-vi
//!
//! - **[`position`]** — `Position` (line, col), 0-indexed char offsets
//! - **[`buffer`]** — `Buffer`, an ordered list of lines, and `splice`
//! - **[`columns`]** — logical ↔ visual column mapping and tab expansion
//! - **[`settings`]** — `Settings` and the Normal-mode `Keymap`
//! - **[`layout`]** — `Panel` viewports arranged into `Tab`s by a split tree
//! - **[`motion`]** — cursor motions with line wrap and scrolling
//! - **[`mode`]** — `Normal` / `Insert`
//! - **[`editor`]** — `EditorState`, key dispatch, and the `Editor` app
//! - **[`render`]** — paints the state through m-term's `Terminal`

pub mod buffer;
pub mod columns;
pub mod editor;
pub mod layout;
pub mod mode;
pub mod motion;
pub mod position;
pub mod render;
pub mod settings;
