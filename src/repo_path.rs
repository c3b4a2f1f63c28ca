// Copyright 2026 The Multiblame Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Repository-relative, slash-separated paths.
//!
//! Simplified relative to the teacher's `repo_path.rs` (no separate
//! borrowed/owned `RepoPathComponent` pair built on `ref-cast`, no
//! content-hash derive): this crate never needs to intern or hash path
//! components independently of the whole path, so a single owned-`String`
//! newtype with `/`-delimited components is sufficient.

use std::fmt;

/// An owned, repository-relative path using `/` as the component separator
/// regardless of host platform.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RepoPathBuf(String);

impl RepoPathBuf {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.starts_with('/') && !value.ends_with('/'));
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Components split on `/`; never empty for a well-formed path.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The final component, e.g. `"bar.rs"` for `"foo/bar.rs"`.
    pub fn file_name(&self) -> &str {
        self.components().next_back().unwrap_or("")
    }

    /// Everything before the final component, without a trailing slash, or
    /// `""` for a top-level path.
    pub fn dir_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[..i],
            None => "",
        }
    }
}

impl fmt::Debug for RepoPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RepoPathBuf").field(&self.0).finish()
    }
}

impl fmt::Display for RepoPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoPathBuf {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RepoPathBuf {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_and_dir_name() {
        let p = RepoPathBuf::new("src/foo/bar.rs");
        assert_eq!(p.file_name(), "bar.rs");
        assert_eq!(p.dir_name(), "src/foo");

        let top = RepoPathBuf::new("bar.rs");
        assert_eq!(top.file_name(), "bar.rs");
        assert_eq!(top.dir_name(), "");
    }
}
