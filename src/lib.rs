//! A modal editing engine, host-agnostic by design.
//!
//! `vimlet` implements the Vim command language as a pure state machine:
//! key events go in, buffer edits, cursor movement and mode transitions come
//! out. It owns no screen, no file I/O and no event loop — the host supplies
//! a buffer behind the [`TextBuffer`] trait and feeds keys to an [`Engine`].
//!
//! The grammar is the classic
//! `[count]["register][operator][count]{motion|text-object}`, with visual
//! selections, dot-repeat, macros, marks, the jump list, regex search and
//! multiple cursors layered on top.
//!
//! ```
//! use vimlet::{Engine, ScratchBuffer, TextBuffer};
//!
//! let mut engine = Engine::new();
//! let mut buf = ScratchBuffer::from_text("hello world");
//! engine.feed_str(&mut buf, "dw");
//! assert_eq!(buf.contents(), "world");
//! ```

pub mod action;
pub mod buffer;
pub mod composer;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod key;
pub mod keymap;
pub mod marks;
pub mod mode;
pub mod multi_cursor;
pub mod operators;
pub mod options;
pub mod pending;
pub mod position;
pub mod register;
pub mod repeat;
pub mod search;
pub mod text_object;
pub mod traits;
pub mod word;

pub use action::{Action, Command, Motion, Operator, TextObject};
pub use buffer::ScratchBuffer;
pub use engine::Engine;
pub use error::VimError;
pub use key::{parse_notation, KeyCode, KeyEvent, Modifiers};
pub use mode::{Mode, VisualKind};
pub use options::Options;
pub use position::{Position, Range};
pub use register::{Register, RegisterFile, RegisterKind};
pub use search::Direction;
pub use traits::{FeedbackSink, NullFeedback, SearchProvider, TextBuffer};
