use lopdf::content::Operation;
use lopdf::Object;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;

const BODY_SIZE: f32 = 9.0;
const LINE_GAP: f32 = 1.3;
const CELL_PAD: f32 = 3.0;
/// Longer cells are cut and end in `...`
const MAX_CELL_LINES: usize = 12;
/// Rough Helvetica advance as a fraction of font size
const CHAR_WIDTH: f32 = 0.5;

pub const REGULAR: &str = "F1";
pub const BOLD: &str = "F2";

/// Split `text` into lines no wider than `width` points at `size`.
pub fn wrap_text(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * CHAR_WIDTH)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            // Break words that cannot fit on any line
            while word.chars().count() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                lines.push(head);
            }
            let word_chars = word.chars().count();
            let needed = if line.is_empty() { word_chars } else { line.chars().count() + 1 + word_chars };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Standard Type1 fonts only cover Latin-1; anything else prints as `?`.
fn pdf_text(text: &str) -> Object {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();
    Object::string_literal(cleaned)
}

pub struct Column {
    pub title: &'static str,
    /// Share of the printable width
    pub weight: f32,
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn widths(&self) -> Vec<f32> {
        let total: f32 = self.columns.iter().map(|c| c.weight).sum();
        let printable = PAGE_WIDTH - 2.0 * MARGIN;
        self.columns.iter().map(|c| printable * c.weight / total).collect()
    }
}

/// Lays content top to bottom, starting a new A4 page when it runs out of room.
pub struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl Default for PageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageWriter {
    pub fn new() -> Self {
        PageWriter {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text_at(&mut self, x: f32, y: f32, font: &str, size: f32, text: &str) {
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)]));
        ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        ops.push(Operation::new("Tj", vec![pdf_text(text)]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill_gray: Option<f32>) {
        let ops = self.ops();
        let area = vec![Object::Real(x), Object::Real(y), Object::Real(width), Object::Real(height)];
        if let Some(gray) = fill_gray {
            ops.push(Operation::new("g", vec![Object::Real(gray)]));
            ops.push(Operation::new("re", area.clone()));
            ops.push(Operation::new("f", vec![]));
            ops.push(Operation::new("g", vec![Object::Real(0.0)]));
        }
        ops.push(Operation::new("w", vec![Object::Real(0.5)]));
        ops.push(Operation::new("re", area));
        ops.push(Operation::new("S", vec![]));
    }

    /// Bold wrapped text across the full width
    pub fn heading(&mut self, text: &str, size: f32) {
        self.lines(text, BOLD, size);
        self.y -= size * 0.5;
    }

    /// `Label: value` wrapped across the full width
    pub fn field(&mut self, label: &str, value: &str) {
        self.lines(&format!("{}: {}", label, value), REGULAR, BODY_SIZE + 1.0);
    }

    pub fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn lines(&mut self, text: &str, font: &str, size: f32) {
        let line_height = size * LINE_GAP;
        for line in wrap_text(text, PAGE_WIDTH - 2.0 * MARGIN, size) {
            self.ensure_room(line_height);
            self.y -= line_height;
            self.text_at(MARGIN, self.y + size * 0.25, font, size, &line);
        }
    }

    /// Draw a bordered table; the header row repeats on every page it spans.
    pub fn table(&mut self, table: &Table) {
        let widths = table.widths();
        let header: Vec<String> = table.columns.iter().map(|c| c.title.to_string()).collect();
        let header_height = self.row_height(&header, &widths);

        self.ensure_room(header_height * 2.0);
        self.row(&header, &widths, BOLD, Some(0.88));

        for cells in &table.rows {
            let height = self.row_height(cells, &widths);
            if self.y - height < MARGIN {
                self.new_page();
                self.ensure_room(header_height);
                self.row(&header, &widths, BOLD, Some(0.88));
            }
            self.row(cells, &widths, REGULAR, None);
        }
        self.y -= BODY_SIZE;
    }

    fn cell_lines(text: &str, width: f32) -> Vec<String> {
        let mut lines = wrap_text(text, width - 2.0 * CELL_PAD, BODY_SIZE);
        if lines.len() > MAX_CELL_LINES {
            lines.truncate(MAX_CELL_LINES);
            if let Some(last) = lines.last_mut() {
                last.push_str("...");
            }
        }
        lines
    }

    fn row_height(&self, cells: &[String], widths: &[f32]) -> f32 {
        let most_lines = cells
            .iter()
            .zip(widths)
            .map(|(text, width)| Self::cell_lines(text, *width).len())
            .max()
            .unwrap_or(1);
        most_lines as f32 * BODY_SIZE * LINE_GAP + 2.0 * CELL_PAD
    }

    fn row(&mut self, cells: &[String], widths: &[f32], font: &str, fill: Option<f32>) {
        let height = self.row_height(cells, widths);
        let top = self.y;
        let mut x = MARGIN;
        for (text, width) in cells.iter().zip(widths) {
            self.rect(x, top - height, *width, height, fill);
            let mut baseline = top - CELL_PAD - BODY_SIZE;
            for line in Self::cell_lines(text, *width) {
                self.text_at(x + CELL_PAD, baseline, font, BODY_SIZE, &line);
                baseline -= BODY_SIZE * LINE_GAP;
            }
            x += width;
        }
        self.y = top - height;
    }

    pub fn finish(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        // 9pt at 0.5 em leaves 10 characters in 45 points
        let lines = wrap_text("water supply and sanitation", 45.0, 9.0);
        assert_eq!(lines, vec!["water", "supply and", "sanitation"]);
    }

    #[test]
    fn splits_overlong_words() {
        let lines = wrap_text("abcdefghijklmnop", 45.0, 9.0);
        assert_eq!(lines, vec!["abcdefghij", "klmnop"]);
    }

    #[test]
    fn accented_text_wraps_by_characters() {
        // 9 characters but 11 bytes
        assert_eq!(wrap_text("Ndé Kério", 45.0, 9.0), vec!["Ndé Kério"]);
    }

    #[test]
    fn empty_text_is_one_blank_line() {
        assert_eq!(wrap_text("", 100.0, 9.0), vec![String::new()]);
    }

    #[test]
    fn long_tables_spill_onto_new_pages() {
        let table = Table {
            columns: vec![Column { title: "Name", weight: 1.0 }, Column { title: "Budget", weight: 1.0 }],
            rows: (0..120).map(|i| vec![format!("Row {}", i), "1,000.00".to_string()]).collect(),
        };
        let mut writer = PageWriter::new();
        writer.table(&table);
        assert!(writer.page_count() > 1);
        let pages = writer.finish();
        // header text appears on every page
        for page in &pages {
            let has_header = page.iter().any(|op| {
                op.operator == "Tj" && matches!(op.operands.first(), Some(Object::String(bytes, _)) if bytes == b"Budget")
            });
            assert!(has_header);
        }
    }
}
