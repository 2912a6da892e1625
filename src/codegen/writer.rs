//! Buffered code writer.
//!
//! Handles indentation and, when enabled, `#line` markers so that errors
//! from downstream shader compilers point back at the original source.

const SPACES_PER_INDENT: usize = 4;

pub struct CodeWriter {
    buffer: String,
    /// Source line the next output line is expected to correspond to.
    current_line: u32,
    current_file: Option<String>,
    write_line_directives: bool,
}

impl CodeWriter {
    pub fn new(write_line_directives: bool) -> Self {
        CodeWriter {
            buffer: String::new(),
            current_line: 1,
            current_file: None,
            write_line_directives,
        }
    }

    fn push_indent(&mut self, indent: usize) {
        for _ in 0..indent * SPACES_PER_INDENT {
            self.buffer.push(' ');
        }
    }

    /// Start a line with no source mapping.
    pub fn begin_line(&mut self, indent: usize) {
        self.push_indent(indent);
    }

    /// Start a line mapped to a source position, emitting a `#line` marker
    /// when the position does not match the next expected output line.
    pub fn begin_line_at(&mut self, indent: usize, file: &str, line: u32) {
        if self.write_line_directives
            && (line != self.current_line || self.current_file.as_deref() != Some(file))
        {
            self.buffer.push_str(&format!("#line {line} \"{file}\"\n"));
            self.current_line = line;
            self.current_file = Some(file.to_owned());
        }
        self.push_indent(indent);
    }

    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Close the current line, appending `trailer` first (may be empty).
    pub fn end_line(&mut self, trailer: &str) {
        self.buffer.push_str(trailer);
        self.buffer.push('\n');
        self.current_line += 1;
    }

    pub fn write_line(&mut self, indent: usize, text: &str) {
        self.begin_line(indent);
        self.write(text);
        self.end_line("");
    }

    pub fn write_line_at(&mut self, indent: usize, file: &str, line: u32, text: &str) {
        self.begin_line_at(indent, file, line);
        self.write(text);
        self.end_line("");
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::CodeWriter;

    #[test]
    fn test_plain_lines() {
        let mut writer = CodeWriter::new(false);
        writer.write_line(0, "void main() {");
        writer.write_line(1, "return;");
        writer.write_line(0, "}");
        assert_eq!(writer.finish(), "void main() {\n    return;\n}\n");
    }

    #[test]
    fn test_begin_write_end() {
        let mut writer = CodeWriter::new(false);
        writer.begin_line(1);
        writer.write("float x");
        writer.write(" = 1");
        writer.end_line(";");
        assert_eq!(writer.finish(), "    float x = 1;\n");
    }

    #[test]
    fn test_line_directive_on_mismatch() {
        let mut writer = CodeWriter::new(true);
        // The first mapped line always announces its file.
        writer.write_line_at(0, "a.hlsl", 1, "float x;");
        // Line 2 matches the expected next line, so no marker.
        writer.write_line_at(0, "a.hlsl", 2, "float y;");
        // Line 10 does not.
        writer.write_line_at(0, "a.hlsl", 10, "float z;");
        assert_eq!(
            writer.finish(),
            "#line 1 \"a.hlsl\"\nfloat x;\nfloat y;\n#line 10 \"a.hlsl\"\nfloat z;\n"
        );
    }

    #[test]
    fn test_line_directive_on_file_change() {
        let mut writer = CodeWriter::new(true);
        writer.write_line_at(0, "a.hlsl", 1, "float x;");
        writer.write_line_at(0, "b.hlsl", 2, "float y;");
        assert_eq!(
            writer.finish(),
            "#line 1 \"a.hlsl\"\nfloat x;\n#line 2 \"b.hlsl\"\nfloat y;\n"
        );
    }

    #[test]
    fn test_directives_disabled() {
        let mut writer = CodeWriter::new(false);
        writer.write_line_at(0, "a.hlsl", 40, "float x;");
        assert_eq!(writer.finish(), "float x;\n");
    }
}
