// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 引擎模块
///
/// 定义浏览器自动化能力接口，并提供基于 Chromium 的实现
pub mod chromium_engine;
pub mod scripted_engine;
pub mod traits;
