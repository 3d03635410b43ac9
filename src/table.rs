use itertools::Itertools;

use crate::list::BookList;
use crate::model::Book;

const HEADERS: [&str; 6] = ["ID", "Title", "Author", "Genre", "Published Year", "Status"];

fn row(book: &Book) -> [String; 6] {
    [
        book.id.clone(),
        book.title.clone(),
        book.author.clone(),
        book.genre.clone(),
        book.published_year.to_string(),
        book.status.to_string(),
    ]
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells.iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .join(" | ")
        .trim_end()
        .to_owned()
}

/// Plain text table of the current page followed by a pagination footer.
pub fn render(list: &BookList) -> String {
    let query = list.query();
    let footer = format!(
        "Page {} of {} ({} per page), {} total",
        query.page, list.page_count(), query.page_size, list.total()
    );
    if list.books().is_empty() {
        return format!("No books found\n{}", footer);
    }

    let headers = HEADERS.iter().map(|h| h.to_string()).collect_vec();
    let rows = list.books().iter().map(row).collect_vec();
    let widths = (0..HEADERS.len())
        .map(|i| rows.iter()
            .map(|r| r[i].chars().count())
            .chain(std::iter::once(HEADERS[i].len()))
            .max()
            .unwrap_or(0))
        .collect_vec();

    let mut out = vec![
        line(&headers, &widths),
        widths.iter().map(|w| "-".repeat(*w)).join("-+-"),
    ];
    out.extend(rows.iter().map(|r| line(r, &widths)));
    out.push(footer);
    out.join("\n")
}
