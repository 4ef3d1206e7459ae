mod diagnostics;
mod grouping;
