// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

/// 审计请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AuditRequestDto {
    /// 要审计的页面URL，只接受 http/https
    #[validate(url, custom(function = "validate_web_scheme"))]
    pub url: String,
}

/// 审计历史查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct AuditListQuery {
    /// 返回条数，默认 20
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl AuditListQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT) as usize
    }
}

fn validate_web_scheme(url: &str) -> Result<(), ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("unsupported_scheme")),
    }
}
