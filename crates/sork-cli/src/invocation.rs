//! Rewriting of compile commands into other tool invocations.
//!
//! Invocations are handled as shell words. Quotes are kept in the words so
//! that the rewritten invocation can be handed to the shell again.

/// Compiler and flags replacing the compiler of a compile command when
/// running the static analyzer.
pub const ANALYZER: &str = "clang++ --analyze -Xanalyzer -analyzer-output=text";

const DEPENDENCY_FLAGS: &[&str] = &["-M", "-MM", "-MG", "-MP", "-MD", "-MMD"];
const DEPENDENCY_FLAGS_WITH_ARGUMENT: &[&str] = &["-MF", "-MT", "-MQ"];

/// Splits a shell-style command line into words, keeping quotes and
/// escapes as they are.
pub fn split_words(invocation: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = None;
    let mut quote = None;
    let mut escaped = false;

    for (index, c) in invocation.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, c) if c.is_whitespace() => {
                if let Some(start) = start.take() {
                    words.push(&invocation[start..index]);
                }
                continue;
            }
            _ => {}
        }

        start.get_or_insert(index);
    }

    if let Some(start) = start {
        words.push(&invocation[start..]);
    }

    words
}

/// The word without surrounding single quotes.
fn bare(word: &str) -> &str {
    word.strip_prefix('\'')
        .and_then(|w| w.strip_suffix('\''))
        .unwrap_or(word)
}

fn is_warning_flag(flag: &str) -> bool {
    flag.strip_prefix("-W").is_some_and(|rest| {
        !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '=')
    })
}

/// Rewrites a compile command into a static analyzer run that prints its
/// findings as text instead of producing an object file.
pub fn analyzer_invocation(invocation: &str) -> String {
    let mut words = split_words(invocation).into_iter();
    words.next();

    let mut out = vec![ANALYZER];
    while let Some(word) = words.next() {
        match bare(word) {
            "-c" | "-pipe" => {}
            "-o" => {
                words.next();
            }
            flag if is_warning_flag(flag) || DEPENDENCY_FLAGS.contains(&flag) => {}
            flag if DEPENDENCY_FLAGS_WITH_ARGUMENT.contains(&flag) => {
                words.next();
            }
            _ => out.push(word),
        }
    }

    out.join(" ")
}

/// Rewrites a compile command to write assembler to standard output.
pub fn assembler_invocation(invocation: &str, verbose_asm: bool) -> String {
    let mut words = split_words(invocation).into_iter();

    let mut out: Vec<&str> = words.next().into_iter().collect();
    while let Some(word) = words.next() {
        match bare(word) {
            "-c" => {
                out.push("-S");
                if verbose_asm {
                    out.push("-fverbose-asm");
                }
            }
            "-o" => {
                words.next();
                out.push("-o-");
            }
            flag if DEPENDENCY_FLAGS.contains(&flag) => {}
            flag if DEPENDENCY_FLAGS_WITH_ARGUMENT.contains(&flag) => {
                words.next();
            }
            _ => out.push(word),
        }
    }

    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NINJA_COMMAND: &str = "/usr/bin/c++  -Isrc -I../src -std=c++17 -Wall -Wextra -O2 \
        -MD -MT src/foo.o -MF src/foo.o.d -o src/foo.o -c ../src/foo.cpp";

    #[test]
    fn words_keep_quotes() {
        assert_eq!(
            split_words(r#"g++ '-DNAME="a b"' -DX=\ y "-Ione two"  foo.cpp"#),
            vec!["g++", r#"'-DNAME="a b"'"#, r"-DX=\ y", r#""-Ione two""#, "foo.cpp"]
        );
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn analyzer_drops_output_and_dependency_flags() {
        assert_eq!(
            analyzer_invocation(NINJA_COMMAND),
            "clang++ --analyze -Xanalyzer -analyzer-output=text -Isrc -I../src -std=c++17 -O2 ../src/foo.cpp"
        );
    }

    #[test]
    fn analyzer_drops_quoted_flags() {
        assert_eq!(
            analyzer_invocation("cc '-pipe' '-Wshadow' '-o' 'a.o' -c a.c"),
            "clang++ --analyze -Xanalyzer -analyzer-output=text a.c"
        );
    }

    #[test]
    fn linker_flags_are_not_warning_flags() {
        assert!(is_warning_flag("-Werror=shadow"));
        assert!(!is_warning_flag("-Wl,--as-needed"));
        assert!(!is_warning_flag("-W"));
    }

    #[test]
    fn assembler_writes_to_standard_output() {
        assert_eq!(
            assembler_invocation(NINJA_COMMAND, false),
            "/usr/bin/c++ -Isrc -I../src -std=c++17 -Wall -Wextra -O2 -o- -S ../src/foo.cpp"
        );
        assert_eq!(
            assembler_invocation("gcc -c a.c -o a.o", true),
            "gcc -S -fverbose-asm a.c -o-"
        );
    }
}
