//! Hierarchical configuration trees that round-trip through flat, dotted-key
//! maps.
//!
//! Flatfig loads configuration from flat key-value maps, `.properties` files,
//! environment variables, TOML, and JSON into one tree model, and flattens any
//! tree (or any `Serialize` value) back into a flat map.
//!
//! ```ignore
//! let source = Source::flat([
//!     ("server.host", "localhost"),
//!     ("server.ports.0", "80"),
//!     ("server.ports.1", "443"),
//!     ("server.tags", "web,prod"),
//! ]);
//! assert_eq!(source.get("server.ports.1")?.as_value(), Some(&Scalar::from("443")));
//!
//! let flat = source.to_flat_map()?;
//! assert_eq!(flat["server.ports"], "80,443");
//! ```
//!
//! # The tree
//!
//! A [`TreeNode`] is a container (ordered key → node map), a list, or a
//! scalar value. Paths address nodes with dots; list elements answer to their
//! index, so `server.ports.1` works whether `ports` came from a TOML array or
//! from flat `ports.0`/`ports.1` keys.
//!
//! # Flat maps are ambiguous
//!
//! In a flat map every value is a string and every key is a path. That loses
//! information:
//!
//! - `a.0 = x`, `a.1 = y` could be a list or a map with keys `"0"` and `"1"`.
//! - `a = x,y` could be a list or a string with a comma in it.
//! - `a = x` could be a string or a one-element list.
//! - `a =` could be an empty string or an empty list.
//!
//! Flatfig resolves these when building a flat source, in a step called
//! **list promotion**:
//!
//! - A container whose keys are exactly `0..N-1` becomes a list. Gaps, a
//!   missing `0`, or extra keys keep it a container.
//! - A string containing commas is split into a list, in order, keeping
//!   empty segments.
//! - `""` becomes [`TreeNode::EmptyString`], readable both as `""` and `[]`.
//! - Any other string becomes [`TreeNode::SingleString`], readable both as
//!   `"x"` and `["x"]`.
//!
//! The last two stay ambiguous on purpose. The consumer knows what it expects
//! and asks for that view with [`as_value()`](TreeNode::as_value) or
//! [`as_list()`](TreeNode::as_list).
//!
//! Promotion is idempotent: promoting an already-promoted tree changes nothing.
//!
//! # Flattening
//!
//! [`to_flat_map()`] applies the same rules in reverse:
//!
//! | Tree | Flat |
//! |------|------|
//! | `{a = {b = "x"}}` | `a.b = x` |
//! | `{a = ["x", "y"]}` | `a = x,y` |
//! | `{a = []}` | `a =` |
//! | `{a = ["x,y", "z"]}` | `a.0 = x,y`, `a.1 = z` |
//! | `{a = [["x"], ["y"]]}` | `a.0 = x`, `a.1 = y` |
//!
//! Scalars containing commas force the indexed form, since joining them would
//! read back as extra elements. Building a flat map, promoting it, and
//! flattening it again gives back the same tree.
//!
//! # Sources
//!
//! A [`Source`] pairs a tree with [`SourceInfo`] metadata (at least a
//! `"type"`). Sources come from:
//!
//! - [`Source::flat`]: any iterator of `(path, value)` pairs.
//! - [`Source::from_env`]: `PREFIX__A__B=v` becomes `a.b = v`.
//! - [`PropertiesProvider`]: `key=value` files.
//! - [`TomlProvider`] and [`JsonProvider`] (features `toml` and `json`, on by
//!   default). Native formats keep their own lists and maps and skip
//!   promotion. JSON `null` is dropped.
//!
//! All providers share the [`Provider`] trait: `load_str()` for text,
//! `load_path()` for files.
//!
//! # Error handling
//!
//! Building, promoting, and looking up are total: a missing key is `None`.
//! Parsing, I/O, and integer narrowing return [`FlatfigError`]. Narrowing
//! with [`TreeNode::to_int`] reports values outside the target type's range
//! instead of truncating them.
//!
//! # Logging
//!
//! Flatfig emits [`tracing`](https://docs.rs/tracing) events (`debug` for
//! loads and overwritten paths, `trace` for promotions, `warn` for path
//! conflicts). It never installs a subscriber.

pub mod error;
pub mod properties;
pub mod tree;

mod env;
mod flat;
mod flatten;
mod promote;
mod provider;
mod source;

#[cfg(test)]
mod fixtures;

pub use env::{env_source, env_to_flat_map};
pub use error::FlatfigError;
pub use flat::{build_tree, flat_tree};
pub use flatten::to_flat_map;
pub use promote::{promote, promote_to_list};
pub use properties::PropertiesProvider;
pub use provider::Provider;
#[cfg(feature = "json")]
pub use provider::JsonProvider;
#[cfg(feature = "toml")]
pub use provider::TomlProvider;
pub use source::{Source, SourceInfo};
pub use tree::{ContainerNode, Scalar, SingleString, TreeNode};
