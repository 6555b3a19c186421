/// Terminal front end: keyboard in, frames out.

pub mod input;
pub mod renderer;
