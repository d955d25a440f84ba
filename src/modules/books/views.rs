//! Derived views over the catalog: search/filter and the genre universe.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::models::{Book, BookStatus, Genre};

const ALL: &str = "All";

/// A filter criterion: either the `All` sentinel or one concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL) {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str(ALL),
            Selection::Only(value) => value.serialize(serializer),
        }
    }
}

/// Current search and filter criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub search: String,
    pub genre: Selection<Genre>,
    pub status: Selection<BookStatus>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = book.title.to_lowercase().contains(&term)
            || book.author.to_lowercase().contains(&term);

        matches_search && self.genre.matches(&book.genre) && self.status.matches(&book.status)
    }
}

/// Records matching `filter`, in catalog order.
pub fn filter_books<'a>(books: &'a [Book], filter: &BookFilter) -> Vec<&'a Book> {
    books.iter().filter(|book| filter.matches(book)).collect()
}

/// `All` followed by each genre present in the catalog, in order of first appearance.
pub fn genre_universe(books: &[Book]) -> Vec<Selection<Genre>> {
    let mut universe = vec![Selection::All];
    for book in books {
        let genre = Selection::Only(book.genre);
        if !universe.contains(&genre) {
            universe.push(genre);
        }
    }
    universe
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, title: &str, author: &str, genre: Genre, status: BookStatus) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre,
            status,
            cover_image_url: None,
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("1", "Dune", "Frank Herbert", Genre::ScienceFiction, BookStatus::Available),
            book("2", "Emma", "Jane Austen", Genre::Fiction, BookStatus::CheckedOut),
            book("3", "Neuromancer", "William Gibson", Genre::ScienceFiction, BookStatus::CheckedOut),
            book("4", "The Hobbit", "J. R. R. Tolkien", Genre::Fantasy, BookStatus::Available),
            book("5", "Dune Messiah", "Frank Herbert", Genre::ScienceFiction, BookStatus::Available),
        ]
    }

    fn ids(books: &[&Book]) -> Vec<String> {
        books.iter().map(|b| b.id.clone()).collect()
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let books = shelf();
        let filtered = filter_books(&books, &BookFilter::default());
        assert_eq!(ids(&filtered), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_author() {
        let books = shelf();
        let by_title = BookFilter {
            search: "dUnE".to_string(),
            ..BookFilter::default()
        };
        assert_eq!(ids(&filter_books(&books, &by_title)), vec!["1", "5"]);

        let by_author = BookFilter {
            search: "gibson".to_string(),
            ..BookFilter::default()
        };
        assert_eq!(ids(&filter_books(&books, &by_author)), vec!["3"]);
    }

    #[test]
    fn criteria_are_combined() {
        let books = shelf();
        let filter = BookFilter {
            search: "e".to_string(),
            genre: Selection::Only(Genre::ScienceFiction),
            status: Selection::Only(BookStatus::Available),
        };
        assert_eq!(ids(&filter_books(&books, &filter)), vec!["1", "5"]);

        let nothing = BookFilter {
            genre: Selection::Only(Genre::History),
            ..BookFilter::default()
        };
        assert!(filter_books(&books, &nothing).is_empty());
    }

    #[test]
    fn filtered_output_is_a_subsequence() {
        let books = shelf();
        let filters = [
            BookFilter::default(),
            BookFilter {
                status: Selection::Only(BookStatus::CheckedOut),
                ..BookFilter::default()
            },
            BookFilter {
                search: "an".to_string(),
                ..BookFilter::default()
            },
            BookFilter {
                genre: Selection::Only(Genre::Fantasy),
                ..BookFilter::default()
            },
        ];

        for filter in &filters {
            let filtered = filter_books(&books, filter);
            let mut cursor = books.iter();
            for picked in filtered {
                assert!(
                    cursor.any(|b| std::ptr::eq(b, picked)),
                    "{filter:?} broke catalog order"
                );
            }
        }
    }

    #[test]
    fn genre_universe_keeps_first_appearance_order() {
        let universe = genre_universe(&shelf());
        assert_eq!(
            universe,
            vec![
                Selection::All,
                Selection::Only(Genre::ScienceFiction),
                Selection::Only(Genre::Fiction),
                Selection::Only(Genre::Fantasy),
            ]
        );
        assert_eq!(genre_universe(&[]), vec![Selection::All]);
    }

    #[test]
    fn selection_parses_and_serializes_sentinel() {
        assert_eq!("all".parse::<Selection<Genre>>(), Ok(Selection::All));
        assert_eq!(
            "science fiction".parse::<Selection<Genre>>(),
            Ok(Selection::Only(Genre::ScienceFiction))
        );
        assert!("Thriller".parse::<Selection<Genre>>().is_err());

        let json = serde_json::to_string(&genre_universe(&shelf()[..2])).unwrap();
        assert_eq!(json, r#"["All","Science Fiction","Fiction"]"#);
        assert_eq!(Selection::Only(BookStatus::CheckedOut).to_string(), "Checked Out");
    }
}
