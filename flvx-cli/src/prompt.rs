use std::io::{self, BufRead, Write};
use std::path::Path;

use flv_extract::Decision;

/// Maps a typed answer to a decision. Lowercase `n` keeps one file, uppercase
/// `N` keeps all of them.
pub fn parse_answer(answer: &str) -> Option<Decision> {
    match answer.trim() {
        "y" | "Y" | "yes" => Some(Decision::Yes),
        "a" | "A" | "all" => Some(Decision::YesToAll),
        "n" | "no" => Some(Decision::No),
        "N" | "none" => Some(Decision::NoToAll),
        "c" | "C" | "cancel" => Some(Decision::Cancel),
        _ => None,
    }
}

/// Asks on the terminal until a valid answer is typed. End of input cancels.
pub fn ask(path: &Path) -> Decision {
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    let mut line = String::new();

    loop {
        let _ = write!(
            stderr,
            "{} already exists. Overwrite? [y]es / [a]ll / [n]o / [N]one / [c]ancel: ",
            path.display()
        );
        let _ = stderr.flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return Decision::Cancel,
            Ok(_) => {}
        }
        if let Some(decision) = parse_answer(&line) {
            return decision;
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Some(Decision::Yes));
        assert_eq!(parse_answer(" a "), Some(Decision::YesToAll));
        assert_eq!(parse_answer("n"), Some(Decision::No));
        assert_eq!(parse_answer("N"), Some(Decision::NoToAll));
        assert_eq!(parse_answer("cancel"), Some(Decision::Cancel));
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("maybe"), None);
    }
}
