//! 组合流程场景测试
