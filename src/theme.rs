//! Catppuccin Mocha accents, named by what they paint.

use nu_ansi_term::Color;

// Source listing
pub const MOVE_RIGHT: Color = Color::Rgb(137, 220, 235); // sky
pub const MOVE_LEFT: Color = Color::Rgb(148, 226, 213); // teal
pub const INCREMENT: Color = Color::Rgb(166, 227, 161); // green
pub const DECREMENT: Color = Color::Rgb(243, 139, 168); // red
pub const OUTPUT: Color = Color::Rgb(249, 226, 175); // yellow
pub const INPUT: Color = Color::Rgb(250, 179, 135); // peach
pub const LOOP: Color = Color::Rgb(203, 166, 247); // mauve
pub const BREAKPOINT: Color = Color::Rgb(137, 180, 250); // blue
pub const COMMENT: Color = Color::Rgb(108, 112, 134); // surface2

// Command line
pub const COMMAND: Color = LOOP;
pub const UNKNOWN_COMMAND: Color = DECREMENT;
pub const ARGUMENT: Color = INPUT;
