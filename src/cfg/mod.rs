//! cfg 模块 - 组件配置
//!
//! `TypeOptions` 描述一个可插拔组件（类型名 + 选项），
//! 注册表按 trait 保存构造器，按名称创建 trait object。

#[macro_use]
mod macros;
pub mod registry;
pub mod type_options;

pub use registry::{create_trait_from_type_options, register_trait, registered_type_names};
pub use type_options::TypeOptions;
