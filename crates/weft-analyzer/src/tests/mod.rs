mod package;
mod test_helpers;
