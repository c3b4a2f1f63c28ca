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

//! Components C and D: rename/copy detection (SPEC_FULL.md §4.C, §4.D).

pub mod detector;
pub mod path_score;
pub mod similarity_detector;

pub use detector::detect_renames;
pub use detector::DetectorOutcome;
