//! Assembler command implementation.

use anyhow::Result;
use sork_core::{source, tool, ToolEnvironment};
use std::collections::HashMap;
use std::path::Path;

use super::{locate_project, Options};
use crate::invocation::assembler_invocation;

/// Prints the assembler the compiler generates for `file`, or with `count`
/// how often each opcode occurs in it.
pub fn run(options: &Options, file: &Path, verbose_asm: bool, count: bool) -> Result<()> {
    let project = locate_project(options, &[file.to_path_buf()])?;
    let source_file = source::find_file(&project, file).map_err(sork_core::Error::from)?;

    let Some(command) = source_file.compile_command else {
        return Err(sork_core::Error::Command(format!(
            "do not know how to compile {}",
            source_file.path.display()
        ))
        .into());
    };

    let environment = ToolEnvironment::for_project(&project).map_err(sork_core::Error::from)?;
    let invocation = assembler_invocation(&command.invocation, verbose_asm);
    let output = tool::run_shell(&invocation, &command.work_dir, &environment)
        .map_err(sork_core::Error::from)?;

    if !output.success {
        return Err(sork_core::Error::Command(format!(
            "failed to run compiler command for outputting assembler:\n{}",
            output.output.trim_end()
        ))
        .into());
    }

    if count {
        for (opcode, n) in count_opcodes(&output.output) {
            println!("{n:>8} {opcode}");
        }
    } else {
        print!("{}", output.output);
    }

    Ok(())
}

/// Opcode of an assembler line, or `None` for blank lines, comments,
/// directives and lone labels.
fn opcode(line: &str) -> Option<&str> {
    let mut words = line.split_whitespace();
    let mut word = words.next()?;

    if word.ends_with(':') {
        word = words.next()?;
    }

    let is_comment = word.starts_with('#') || word.starts_with(';') || word.starts_with("//");
    (!is_comment && !word.starts_with('.')).then_some(word)
}

/// Counts opcodes in assembler output, most frequent first and ties in
/// alphabetical order.
fn count_opcodes(assembly: &str) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for opcode in assembly.lines().filter_map(opcode) {
        *counts.entry(opcode).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(opcode, n)| (opcode.to_string(), n))
        .collect();
    counts.sort_by(|(a, a_n), (b, b_n)| b_n.cmp(a_n).then_with(|| a.cmp(b)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSEMBLY: &str = "\
\t.file\t\"foo.cpp\"
\t.text
\t.globl\tmain
main:
.LFB0:
\t.cfi_startproc
\tpushq\t%rbp
\tmovq\t%rsp, %rbp
\tmovl\t$0, %eax # comment after
\tmovl\t%eax, %edx
# line comment
.L2: jmp .L2
\tpopq\t%rbp
\tret
\t.cfi_endproc
";

    #[test]
    fn directives_labels_and_comments_are_not_opcodes() {
        assert_eq!(opcode("\t.text"), None);
        assert_eq!(opcode("main:"), None);
        assert_eq!(opcode("# comment"), None);
        assert_eq!(opcode("  ; comment"), None);
        assert_eq!(opcode("// comment"), None);
        assert_eq!(opcode(""), None);
        assert_eq!(opcode(".L2: jmp .L2"), Some("jmp"));
        assert_eq!(opcode("\tret"), Some("ret"));
    }

    #[test]
    fn opcodes_are_counted_by_frequency_then_name() {
        let counts = count_opcodes(ASSEMBLY);
        let expected = [("movl", 2), ("jmp", 1), ("movq", 1), ("popq", 1), ("pushq", 1), ("ret", 1)]
            .map(|(opcode, n)| (opcode.to_string(), n));

        assert_eq!(counts, expected);
    }
}
