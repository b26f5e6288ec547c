mod navigator_tests;
mod support;
