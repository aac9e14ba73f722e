// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod common;
mod schema;
