use anyhow::Result;
use log::*;
use structopt::StructOpt;

use bookshelf::model::{BookStatus, Credentials, Registration};
use bookshelf::prompt::{self, AssumeYes, Confirm, Terminal};
use bookshelf::query::parse_page_size;
use bookshelf::{form, table};
use bookshelf::{
    delete_book, ApiClient, BookChanges, BookForm, BookList, DeleteOutcome, FileStorage,
    HttpTransport, ListQuery, Notice, Session,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "bookshelf", about = "Browse and manage a book catalog")]
struct Opt {
    /// Base URL of the catalog API
    #[structopt(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:5000/api")]
    api_url: String,
    /// Where the session token and user are kept
    #[structopt(long, env = "BOOKSHELF_SESSION_DIR", default_value = "~/.config/bookshelf")]
    session_dir: String,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Log in with email and password
    Login {
        #[structopt(long)]
        email: Option<String>,
        #[structopt(long)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[structopt(long)]
        fullname: Option<String>,
        #[structopt(long)]
        email: Option<String>,
        #[structopt(long)]
        password: Option<String>,
    },
    Logout,
    /// Show who is logged in
    Whoami,
    /// List books, one page at a time
    List(ListArgs),
    /// Add a new book
    Add(BookArgs),
    /// Edit a book on the selected page
    Edit {
        id: String,
        #[structopt(flatten)]
        book: BookArgs,
        #[structopt(flatten)]
        list: LocateArgs,
    },
    /// Delete a book on the selected page
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[structopt(long)]
        yes: bool,
        #[structopt(flatten)]
        list: LocateArgs,
    },
}

#[derive(Debug, StructOpt)]
struct ListArgs {
    #[structopt(long, default_value = "1")]
    page: u32,
    #[structopt(long, default_value = "10", parse(try_from_str = parse_page_size))]
    limit: u32,
    #[structopt(long)]
    genre: Option<String>,
    #[structopt(long, possible_values = &["Available", "Issued"])]
    status: Option<BookStatus>,
    /// Search by title or author
    #[structopt(long)]
    search: Option<String>,
}

impl ListArgs {
    fn into_list(self) -> BookList {
        let mut list = BookList::new(ListQuery::default());
        list.set_page_size(self.limit);
        list.set_genre(self.genre);
        list.set_status(self.status);
        list.set_search(self.search);
        // Explicit page last, the setters above start over at page 1
        list.set_page(self.page);
        list
    }
}

/// Which page to look for the book on
#[derive(Debug, StructOpt)]
struct LocateArgs {
    #[structopt(long, default_value = "1")]
    page: u32,
    #[structopt(long, default_value = "10", parse(try_from_str = parse_page_size))]
    limit: u32,
    /// Search by title or author
    #[structopt(long)]
    search: Option<String>,
}

impl LocateArgs {
    fn into_list(self) -> BookList {
        ListArgs {
            page: self.page,
            limit: self.limit,
            genre: None,
            status: None,
            search: self.search,
        }.into_list()
    }
}

#[derive(Debug, StructOpt)]
struct BookArgs {
    #[structopt(long)]
    title: Option<String>,
    #[structopt(long)]
    author: Option<String>,
    #[structopt(long)]
    genre: Option<String>,
    /// Four digit year of publication
    #[structopt(long = "year")]
    published_year: Option<String>,
    /// Available or Issued
    #[structopt(long)]
    status: Option<String>,
}

impl From<BookArgs> for BookChanges {
    fn from(args: BookArgs) -> Self {
        BookChanges {
            title: args.title,
            author: args.author,
            genre: args.genre,
            published_year: args.published_year,
            status: args.status,
        }
    }
}

type Api = ApiClient<HttpTransport>;

fn main() {
    pretty_env_logger::init();
    let opt = Opt::from_args();
    debug!("Options {:?}", opt);
    match run(opt) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

// Ok(false) when the command was refused, the notice has been shown already
fn run(opt: Opt) -> Result<bool> {
    let mut session = Session::load(FileStorage::new(&opt.session_dir)?)?;
    let mut api = ApiClient::new(HttpTransport::new(&opt.api_url))
        .with_token(session.token().map(str::to_owned));

    match opt.cmd {
        Cmd::Login { email, password } => {
            let credentials = Credentials {
                email: value_or_prompt(email, "Email: ")?,
                password: value_or_prompt(password, "Password: ")?,
            };
            Ok(match bookshelf::login(&mut api, &mut session, &credentials) {
                Ok(user) => shown(Notice::success(format!("Login successful, hello {}", user.fullname))),
                Err(e) => shown(Notice::error(e.user_message("Login failed"))),
            })
        }
        Cmd::Signup { fullname, email, password } => {
            let registration = Registration {
                fullname: value_or_prompt(fullname, "Full name: ")?,
                email: value_or_prompt(email, "Email: ")?,
                password: value_or_prompt(password, "Password: ")?,
            };
            Ok(match bookshelf::signup(&mut api, &mut session, &registration) {
                Ok(_) => shown(Notice::success("Signup successful!")),
                Err(e) => shown(Notice::error(e.user_message("Signup failed"))),
            })
        }
        Cmd::Logout => {
            session.logout()?;
            Ok(shown(Notice::success("Logged out successfully!")))
        }
        Cmd::Whoami => {
            match session.user() {
                Some(user) => println!("{}\n{}", user.fullname, user.email),
                None => println!("Not logged in"),
            }
            Ok(true)
        }
        Cmd::List(args) => {
            if let Some(user) = session.user() {
                println!("Hello, {}", user.fullname);
            }
            let mut list = args.into_list();
            let ok = list.refresh(&api).map(shown).unwrap_or(true);
            print_list(&list);
            Ok(ok)
        }
        Cmd::Add(args) => {
            if !session.is_logged_in() {
                Notice::warning("Please login or signup first!").show();
                return Ok(false);
            }
            add(&api, args)
        }
        Cmd::Edit { id, book, list } => edit(&api, &id, book, list.into_list()),
        Cmd::Delete { id, yes, list } => {
            let mut confirm: Box<dyn Confirm> = if yes { Box::new(AssumeYes) } else { Box::new(Terminal) };
            delete(&api, &id, list.into_list(), confirm.as_mut())
        }
    }
}

fn add(api: &Api, args: BookArgs) -> Result<bool> {
    let form = BookForm::default().apply(args.into());
    let mut list = BookList::default();
    let mut refreshed = None;
    let result = form::create(api, &form, |_| refreshed = list.refresh(api));
    Ok(after_submit(result, refreshed, &list))
}

fn edit(api: &Api, id: &str, changes: BookArgs, mut list: BookList) -> Result<bool> {
    if let Some(notice) = list.refresh(api) {
        if !shown(notice) {
            return Ok(false);
        }
    }
    let book = match list.find(id) {
        Some(book) => book.clone(),
        None => return Ok(shown(not_on_page(id, &list))),
    };
    let form = BookForm::from_book(&book).apply(changes.into());
    let mut refreshed = None;
    let result = form::update(api, &book.id, &form, |_| refreshed = list.refresh(api));
    Ok(after_submit(result, refreshed, &list))
}

fn delete(api: &Api, id: &str, mut list: BookList, confirm: &mut dyn Confirm) -> Result<bool> {
    if let Some(notice) = list.refresh(api) {
        if !shown(notice) {
            return Ok(false);
        }
    }
    // Without the row at hand the id stands in for the title
    let title = list.find(id).map(|b| b.title.clone()).unwrap_or_else(|| id.to_owned());
    Ok(match delete_book(api, &mut list, confirm, id, &title)? {
        DeleteOutcome::Cancelled => {
            println!("Cancelled");
            true
        }
        DeleteOutcome::Deleted(notices) => {
            let ok = notices.into_iter().fold(true, |ok, n| shown(n) && ok);
            print_list(&list);
            ok
        }
        DeleteOutcome::Failed(notice) => shown(notice),
    })
}

fn after_submit(result: Result<Notice, form::FormError>, refreshed: Option<Notice>, list: &BookList) -> bool {
    match result {
        Ok(notice) => {
            shown(notice);
            let ok = refreshed.map(shown).unwrap_or(true);
            print_list(list);
            ok
        }
        Err(e) => shown(Notice::error(e.to_string())),
    }
}

fn not_on_page(id: &str, list: &BookList) -> Notice {
    Notice::error(format!(
        "Book {} is not on page {}, narrow it down with --search or --page",
        id, list.query().page
    ))
}

fn print_list(list: &BookList) {
    println!("{}", table::render(list));
    let genres = list.genres();
    if !genres.is_empty() {
        println!("Genres on this page: {}", genres.join(", "));
    }
}

/// Show a notice, true unless it was an error.
fn shown(notice: Notice) -> bool {
    notice.show();
    !notice.is_error()
}

fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(prompt::read_line(prompt)?.unwrap_or_default()),
    }
}
