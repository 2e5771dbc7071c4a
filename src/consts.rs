/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Stable, user-visible constants.

pub const NUM_REGS: u8 = 32;
pub const MEM_SIZE: usize = 0x100000;
pub const STACK_BASE: u64 = 0x100000;
pub const STACK_LIMIT: u64 = 0x000800;
