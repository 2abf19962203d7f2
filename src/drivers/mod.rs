// Hardware drivers: chip-level and protocol-level, board-independent.
//
// Only pin assignments and bus wiring (in board/) are board-specific.

pub mod gps;
pub mod sdcard;
pub mod storage;
