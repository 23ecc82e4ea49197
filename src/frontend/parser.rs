use log::trace;

use crate::error::{Error, Result};
use crate::frontend::instruction::{ARROW, Instruction, Operand};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat the first token of every line as a label, whatever it looks like.
    /// Otherwise a leading token is a label only when it is a number or ends in ':'.
    pub label_column: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Comments (`//`, `#`) and blank lines carry no instruction and take no line number.
    pub fn is_skipped(line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || line.starts_with("//") || line.starts_with('#')
    }

    /// Parses every instruction line, numbering them from 1.
    pub fn parse_program<I, S>(&self, lines: I) -> Result<Vec<Instruction>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut program = Vec::new();
        for line in lines {
            let line = line.as_ref();
            if Self::is_skipped(line) {
                continue;
            }
            let inst = self.parse(line, program.len() + 1)?;
            trace!("parsed {:?}", inst);
            program.push(inst);
        }
        Ok(program)
    }

    pub fn parse(&self, line: &str, line_number: usize) -> Result<Instruction> {
        let malformed = |reason| Error::MalformedInstruction {
            line: line_number,
            text: line.trim().to_string(),
            reason,
        };

        let normalized = line.replace(',', " ");
        let mut tokens = normalized.split_whitespace().peekable();

        let has_label = tokens
            .peek()
            .is_some_and(|first| self.options.label_column || is_label(first));
        let label = if has_label { tokens.next() } else { None };

        let opcode = match tokens.next() {
            Some(ARROW) => return Err(malformed("expected an opcode before '=>'")),
            Some(opcode) => opcode,
            None => return Err(malformed("missing opcode")),
        };

        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut seen_arrow = false;
        for token in tokens {
            if token == ARROW {
                if seen_arrow {
                    return Err(malformed("more than one '=>'"));
                }
                seen_arrow = true;
            } else if seen_arrow {
                targets.push(Operand::classify(token));
            } else {
                sources.push(Operand::classify(token));
            }
        }

        let mut inst = Instruction::new(opcode, sources, targets, line_number);
        inst.label = label.map(|l| l.trim_end_matches(':').to_string());
        Ok(inst)
    }
}

fn is_label(token: &str) -> bool {
    token.ends_with(':') || token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::instr;

    fn parse(line: &str) -> Result<Instruction> {
        Parser::default().parse(line, 1)
    }

    #[test]
    fn test_parse_three_operand() {
        assert_eq!(
            parse("add r1, r2 => r3").unwrap(),
            instr(1, "add", &["r1", "r2"], &["r3"])
        );
    }

    #[test]
    fn test_parse_commas_without_spaces() {
        assert_eq!(
            parse("add r1,r2 => r3").unwrap(),
            instr(1, "add", &["r1", "r2"], &["r3"])
        );
    }

    #[test]
    fn test_parse_literals_pass_through() {
        let inst = parse("loadI 1024 => r0").unwrap();
        assert_eq!(inst.sources, vec![Operand::Literal("1024".into())]);
        assert_eq!(inst.targets, vec![Operand::Register("r0".into())]);
    }

    #[test]
    fn test_parse_no_operands() {
        let inst = parse("nop").unwrap();
        assert!(inst.sources.is_empty());
        assert!(inst.targets.is_empty());
    }

    #[test]
    fn test_parse_only_targets() {
        let inst = parse("read => r1").unwrap();
        assert!(inst.sources.is_empty());
        assert_eq!(inst.target_registers().collect::<Vec<_>>(), vec!["r1"]);
    }

    #[test]
    fn test_parse_more_than_two_operands() {
        let inst = parse("fma r1, r2, r3 => r4").unwrap();
        assert_eq!(inst.sources.len(), 3);
    }

    #[test]
    fn test_parse_colon_label() {
        let inst = parse("L0: add r1 r2 => r3").unwrap();
        assert_eq!(inst.label.as_deref(), Some("L0"));
        assert_eq!(inst.opcode, "add");
    }

    #[test]
    fn test_parse_numeric_label() {
        let inst = parse("12 loadI 1 => r1").unwrap();
        assert_eq!(inst.label.as_deref(), Some("12"));
        assert_eq!(inst.opcode, "loadI");
        assert_eq!(inst.sources, vec![Operand::Literal("1".into())]);

        let program = Parser::default()
            .parse_program(["1 loadI 1 => r1", "2 add r1, r1 => r2", "3 output r2"])
            .unwrap();
        let opcodes: Vec<_> = program.iter().map(|i| i.opcode.as_str()).collect();
        assert_eq!(opcodes, vec!["loadI", "add", "output"]);
        assert_eq!(program[1].source_registers().collect::<Vec<_>>(), vec!["r1", "r1"]);
    }

    #[test]
    fn test_parse_numeric_label_without_opcode() {
        assert!(matches!(
            parse("4"),
            Err(Error::MalformedInstruction { reason: "missing opcode", .. })
        ));
    }

    #[test]
    fn test_parse_label_column() {
        let parser = Parser::new(ParseOptions { label_column: true });
        let inst = parser.parse("1 add r1 r2 => r3", 7).unwrap();
        assert_eq!(inst.label.as_deref(), Some("1"));
        assert_eq!(inst.opcode, "add");
        assert_eq!(inst.line, 7);

        assert!(matches!(
            parser.parse("L1", 1),
            Err(Error::MalformedInstruction { reason: "missing opcode", .. })
        ));
    }

    #[test]
    fn test_parse_missing_opcode() {
        assert!(matches!(
            parse("L0:"),
            Err(Error::MalformedInstruction { line: 1, .. })
        ));
        assert!(parse("=> r1").is_err());
    }

    #[test]
    fn test_parse_double_arrow() {
        assert!(parse("add r1 => r2 => r3").is_err());
    }

    #[test]
    fn test_program_skips_comments_and_blanks() {
        let lines = [
            "// header",
            "loadI 1 => r1",
            "",
            "   ",
            "# note",
            "  // indented comment",
            "addI r1, 2 => r2",
        ];
        let program = Parser::default().parse_program(lines).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0].line, 1);
        assert_eq!(program[1].line, 2);
        assert_eq!(program[1].opcode, "addI");
    }

    #[test]
    fn test_program_reports_normalized_line() {
        let lines = ["# c", "loadI 1 => r1", "# c", "L9:"];
        match Parser::default().parse_program(lines) {
            Err(Error::MalformedInstruction { line, text, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "L9:");
            }
            other => panic!("expected malformed instruction, got {:?}", other),
        }
    }
}
