//! Guest frontends. Only LoongArch64 lives here.

pub mod la64;
