//! Prelude
#[cfg(feature = "device-selected")]
pub use crate::mdma::MdmaExt as _stm32h7xx_ll_mdma_MdmaExt;
pub use crate::rcc::rec::ResetEnable as _stm32h7xx_ll_rcc_rec_ResetEnable;
#[cfg(feature = "device-selected")]
pub use crate::rcc::RccExt as _stm32h7xx_ll_rcc_RccExt;
pub use crate::time::U32Ext as _stm32h7xx_ll_time_U32Ext;
