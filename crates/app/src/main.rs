use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use portal_core::model::{CourseId, EmployeeId, LessonKind};
use portal_core::{Clock, PortalConfig};
use services::{
    AppServices, ChannelObserver, CoursePlayer, CoursePlayerService, LessonCompletion,
    PlayerEvent, PortalService, QuizAdvance,
};
use storage::catalog;
use storage::repository::Storage;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_URL: &str = "sqlite:portal.sqlite3?mode=rwc";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_answers(raw: String) -> Result<Vec<usize>, ArgsError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_number(part.to_owned(), "--answers"))
        .collect()
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Seed,
    Courses,
    Play {
        course: CourseId,
        email: Option<String>,
        password: Option<String>,
        answers: Vec<usize>,
    },
    Feedback {
        employee: Option<EmployeeId>,
    },
    SendFeedback {
        employee: EmployeeId,
        course: CourseId,
        rating: u8,
        message: String,
        email: Option<String>,
        password: Option<String>,
    },
    AddEmployee {
        name: String,
        email: String,
        department: String,
        position: String,
        password: Option<String>,
    },
    Employees {
        search: String,
        department: Option<String>,
    },
    Status,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    command: Command,
}

#[derive(Default)]
struct Flags {
    course: Option<CourseId>,
    employee: Option<EmployeeId>,
    email: Option<String>,
    password: Option<String>,
    answers: Vec<usize>,
    rating: Option<u8>,
    message: Option<String>,
    name: Option<String>,
    department: Option<String>,
    position: Option<String>,
    search: Option<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PORTAL_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());

        let name = match args.next() {
            None => "status".to_owned(),
            Some(first) if first == "--help" || first == "-h" => {
                print_usage();
                std::process::exit(0);
            }
            Some(first) => first,
        };

        let mut flags = Flags::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--course" => {
                    let value = require_value(&mut args, "--course")?;
                    flags.course = Some(CourseId::new(parse_number(value, "--course")?));
                }
                "--employee" => {
                    let value = require_value(&mut args, "--employee")?;
                    flags.employee = Some(EmployeeId::new(parse_number(value, "--employee")?));
                }
                "--email" => flags.email = Some(require_value(&mut args, "--email")?),
                "--password" => flags.password = Some(require_value(&mut args, "--password")?),
                "--answers" => flags.answers = parse_answers(require_value(&mut args, "--answers")?)?,
                "--rating" => {
                    let value = require_value(&mut args, "--rating")?;
                    flags.rating = Some(parse_number(value, "--rating")?);
                }
                "--message" => flags.message = Some(require_value(&mut args, "--message")?),
                "--name" => flags.name = Some(require_value(&mut args, "--name")?),
                "--department" => {
                    flags.department = Some(require_value(&mut args, "--department")?);
                }
                "--position" => flags.position = Some(require_value(&mut args, "--position")?),
                "--search" => flags.search = Some(require_value(&mut args, "--search")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match name.as_str() {
            "seed" => Command::Seed,
            "courses" => Command::Courses,
            "status" => Command::Status,
            "play" => Command::Play {
                course: flags.course.ok_or(ArgsError::MissingFlag { flag: "--course" })?,
                email: flags.email,
                password: flags.password,
                answers: flags.answers,
            },
            "feedback" => Command::Feedback {
                employee: flags.employee,
            },
            "send-feedback" => Command::SendFeedback {
                employee: flags
                    .employee
                    .ok_or(ArgsError::MissingFlag { flag: "--employee" })?,
                course: flags.course.ok_or(ArgsError::MissingFlag { flag: "--course" })?,
                rating: flags.rating.ok_or(ArgsError::MissingFlag { flag: "--rating" })?,
                message: flags
                    .message
                    .ok_or(ArgsError::MissingFlag { flag: "--message" })?,
                email: flags.email,
                password: flags.password,
            },
            "add-employee" => Command::AddEmployee {
                name: flags.name.ok_or(ArgsError::MissingFlag { flag: "--name" })?,
                email: flags.email.ok_or(ArgsError::MissingFlag { flag: "--email" })?,
                department: flags
                    .department
                    .ok_or(ArgsError::MissingFlag { flag: "--department" })?,
                position: flags
                    .position
                    .ok_or(ArgsError::MissingFlag { flag: "--position" })?,
                password: flags.password,
            },
            "employees" => Command::Employees {
                search: flags.search.unwrap_or_default(),
                department: flags.department,
            },
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        Ok(Self { db_url, command })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- seed    [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- courses [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- status  [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- play --course <id> [--email <email>] [--password <pw>]");
    eprintln!("                              [--answers 0,1,2]");
    eprintln!("  cargo run -p app -- feedback [--employee <id>]");
    eprintln!("  cargo run -p app -- send-feedback --employee <id> --course <id>");
    eprintln!("                                    --rating <1-5> --message <text>");
    eprintln!("                                    [--email <admin>] [--password <pw>]");
    eprintln!("  cargo run -p app -- add-employee --name <n> --email <e> --department <d>");
    eprintln!("                                   --position <p> [--password <admin pw>]");
    eprintln!("  cargo run -p app -- employees [--search <term>] [--department <d>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORTAL_DB_URL, PORTAL_COMPLETION_DELAY_MS, PORTAL_SIGN_IN_DELAY_MS, RUST_LOG");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn portal_config() -> PortalConfig {
    let mut config = PortalConfig::default();
    if let Some(delay) = env_millis("PORTAL_COMPLETION_DELAY_MS") {
        config = config.with_completion_delay(delay);
    }
    if let Some(delay) = env_millis("PORTAL_SIGN_IN_DELAY_MS") {
        config = config.with_sign_in_delay(delay);
    }
    config
}

// ─── COMPANY ───────────────────────────────────────────────────────────────

/// Sign a portal session in with the company credentials, falling back to
/// the configured administrator account.
async fn company_portal(
    services: &AppServices,
    email: Option<String>,
    password: Option<String>,
) -> Result<PortalService, Box<dyn std::error::Error>> {
    let config = services.config();
    let email = email.unwrap_or_else(|| config.admin_email().to_owned());
    let password = password.unwrap_or_else(|| config.admin_password().to_owned());
    let mut portal = services.portal().await?;
    portal.sign_in_company(&email, &password).await?;
    Ok(portal)
}

async fn list_employees(
    services: &AppServices,
    search: &str,
    department: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = services.catalog();
    println!("departments: {}", catalog.departments().await?.join(", "));
    let found = catalog.search_employees(search, department).await?;
    if found.is_empty() {
        println!("No employees match.");
    }
    for employee in found {
        println!(
            "#{} {} <{}> {} / {}, {} completed courses",
            employee.id(),
            employee.name(),
            employee.email(),
            employee.department(),
            employee.position(),
            employee.completed_courses()
        );
    }
    Ok(())
}

// ─── PLAY ──────────────────────────────────────────────────────────────────

/// Who drives lesson completions: a signed-in portal session, or an
/// anonymous player whose progress is never recorded.
enum Driver {
    Portal(Box<PortalService>),
    Anonymous(Arc<CoursePlayerService>),
}

impl Driver {
    async fn complete(
        &mut self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, Box<dyn std::error::Error>> {
        Ok(match self {
            Driver::Portal(portal) => portal.complete_current_lesson(player).await?,
            Driver::Anonymous(players) => players.complete_current_lesson(player).await?,
        })
    }

    async fn finish_quiz(
        &mut self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, Box<dyn std::error::Error>> {
        Ok(match self {
            Driver::Portal(portal) => portal.finish_quiz(player).await?,
            Driver::Anonymous(players) => players.finish_quiz(player).await?,
        })
    }

    async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Driver::Portal(portal) = self {
            portal.close_course().await?;
        }
        Ok(())
    }
}

fn answer_quiz(player: &mut CoursePlayer, answers: &[usize]) {
    let Some(quiz) = player.quiz_mut() else {
        return;
    };
    let questions: Vec<_> = quiz.quiz().questions().iter().map(|q| q.id()).collect();
    for (index, question_id) in questions.into_iter().enumerate() {
        let option = answers.get(index).copied().unwrap_or(0);
        if !quiz.select_answer(question_id, option) {
            debug!(%question_id, option, "answer ignored");
        }
        if let QuizAdvance::Scored(result) = quiz.advance() {
            println!(
                "    quiz: {}/{} points ({}%) {}",
                result.score,
                result.total_points,
                result.percentage,
                if result.passed { "passed" } else { "not passed" }
            );
        }
    }
}

async fn play(
    services: &AppServices,
    course: CourseId,
    email: Option<String>,
    password: Option<String>,
    answers: &[usize],
) -> Result<(), Box<dyn std::error::Error>> {
    let (observer, mut events) = ChannelObserver::channel();
    let observer = Arc::new(observer);

    let (mut driver, mut player) = match email {
        Some(email) => {
            let mut portal = services.portal().await?;
            let password =
                password.unwrap_or_else(|| services.config().employee_password().to_owned());
            let employee = portal.sign_in_employee(&email, &password).await?;
            println!("Signed in as {} <{}>", employee.name(), employee.email());
            let player = portal.open_course(course, observer).await?;
            (Driver::Portal(Box::new(portal)), player)
        }
        None => {
            let players = services.players();
            let player = players.start(course, None, observer).await?;
            (Driver::Anonymous(players), player)
        }
    };

    println!("{}", player.course().title());
    loop {
        let Some(lesson) = player.current_lesson() else {
            break;
        };
        println!("  {} [{:?}]", lesson.title(), lesson.kind());
        let has_quiz = lesson.kind() == LessonKind::Quiz && player.quiz().is_some();

        let outcome = if has_quiz {
            answer_quiz(&mut player, answers);
            driver.finish_quiz(&mut player).await?
        } else {
            driver.complete(&mut player).await?
        };
        let progress = player.progress();
        println!(
            "    {}/{} lessons ({:.0}%)",
            progress.completed, progress.total, progress.percent
        );
        if outcome.course_completed() {
            println!("  Course completed.");
        }
        if !player.select_next_lesson() {
            break;
        }
    }

    if player.has_pending_completion() {
        let wait = services.config().completion_delay() + Duration::from_millis(250);
        match tokio::time::timeout(wait, events.recv()).await {
            Ok(Some(PlayerEvent::CourseCompleted(id))) => println!("Certificate ready for course {id}."),
            Ok(other) => debug!(?other, "unexpected player event"),
            Err(_) => debug!("completion callback did not fire in time"),
        }
    }

    player.back();
    driver.close().await?;
    Ok(())
}

// ─── COMMANDS ──────────────────────────────────────────────────────────────

async fn list_courses(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for course in services.catalog().list_courses().await? {
        println!(
            "{:>3}  {}  ({}; {}; {} modules, {} lessons; {})",
            course.id,
            course.title,
            course.level,
            course.duration,
            course.modules,
            course.lessons,
            course.instructor
        );
    }
    let overview = services.catalog().company_overview().await?;
    println!(
        "{} employees, {} completed courses",
        overview.employees, overview.completed_courses
    );
    Ok(())
}

async fn list_feedback(
    services: &AppServices,
    employee: Option<EmployeeId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let feedback = services.feedback();
    let notes = match employee {
        Some(id) => feedback.list_for_employee(id).await?,
        None => feedback.list_all().await?,
    };
    if notes.is_empty() {
        println!("No feedback.");
    }
    for note in notes {
        println!(
            "#{} {} {} -> {} ({}) {}/5{}",
            note.id(),
            note.date(),
            note.manager_name(),
            note.employee_name(),
            note.course_name(),
            note.rating(),
            if note.is_read() { "" } else { " [unread]" }
        );
        println!("    {}", note.message());
    }
    Ok(())
}

async fn status(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let portal = services.portal().await?;
    let state = portal.state();
    println!("view: {}", state.view());
    if let Some(role) = state.role() {
        println!("role: {}", role.as_str());
    }
    if state.is_demo_mode() {
        println!("demo mode");
    }
    if let Some(user) = state.user() {
        println!(
            "user: {} <{}>, {} completed courses",
            user.name(),
            user.email(),
            user.completed_courses()
        );
    }
    if let Some(course) = state.course_id() {
        println!("course: {course}");
    }
    if let Some(learner) = state.learner() {
        let unread = services.feedback().unread_count(learner.id()).await?;
        println!("unread feedback: {unread}");
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    debug!(db = %args.db_url, command = ?args.command, "starting");

    if args.command == Command::Seed {
        let storage = Storage::sqlite(&args.db_url).await?;
        let report = catalog::seed(&storage).await?;
        println!(
            "Seeded {} courses, {} employees and {} feedback notes into {}",
            report.courses, report.employees, report.feedback, args.db_url
        );
        return Ok(());
    }

    let services = AppServices::new_sqlite(&args.db_url, Clock::system(), portal_config()).await?;
    match args.command {
        Command::Seed => Ok(()),
        Command::Courses => list_courses(&services).await,
        Command::Status => status(&services).await,
        Command::Feedback { employee } => list_feedback(&services, employee).await,
        Command::SendFeedback {
            employee,
            course,
            rating,
            message,
            email,
            password,
        } => {
            let portal = company_portal(&services, email, password).await?;
            let note = portal
                .send_feedback(employee, course, &message, rating)
                .await?;
            println!("Sent feedback #{} to {}", note.id(), note.employee_name());
            Ok(())
        }
        Command::AddEmployee {
            name,
            email,
            department,
            position,
            password,
        } => {
            let portal = company_portal(&services, None, password).await?;
            let employee = portal
                .add_employee(&name, &email, &department, &position)
                .await?;
            println!(
                "Registered #{} {} <{}>",
                employee.id(),
                employee.name(),
                employee.email()
            );
            Ok(())
        }
        Command::Employees { search, department } => {
            list_employees(&services, &search, department.as_deref()).await
        }
        Command::Play {
            course,
            email,
            password,
            answers,
        } => play(&services, course, email, password, &answers).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
