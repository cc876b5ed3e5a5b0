//! Zone fixtures for unit tests.
//!
//! Each test owns a [`test::TestContext`] the way each compilation owns a
//! zone; everything allocated through it is released when the context drops.
