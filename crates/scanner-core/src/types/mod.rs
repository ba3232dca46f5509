//! 스캐너 전반에서 사용되는 공통 타입.

mod candle;
mod signal;
mod symbol;

pub use candle::*;
pub use signal::*;
pub use symbol::*;
