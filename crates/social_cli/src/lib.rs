//! Command-line interface for the social graph.
//!
//! # Usage
//!
//! ```bash
//! # Look up an administrator (role defaults to ADMIN)
//! social admin 0x01
//!
//! # Look up a user with a page of friends
//! social user 0x02 --friends-first 1
//!
//! # Search by name
//! social search Potter --fields id,name
//!
//! # Print the schema
//! social schema
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::{json, Map, Value};
use social_graph::{executor, fixture, SDL};
use social_runtime::{
    Context, ExecutorConfig, FieldError, Operation, PathSegment, PlannerConfig, QueryPlanner,
    Response, SelectionNode,
};
use std::sync::Arc;
use tracing::debug;

const ADMIN_FIELDS: &[&str] = &["__typename", "id", "name", "role"];
const USER_FIELDS: &[&str] = &[
    "id",
    "name",
    "email",
    "role",
    "phone",
    "address",
    "createdAt",
];
const SEARCH_FIELDS: &[&str] = &["__typename", "id", "name"];
const FRIEND_FIELDS: &[&str] = &["id", "name"];

#[derive(Parser, Debug)]
#[command(name = "social")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level and trace every resolved field
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not print errors to stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the response on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Reject selections deeper than this (0 disables the check)
    #[arg(long, global = true, default_value = "0")]
    pub max_depth: usize,

    /// Maximum number of resolvers running at once
    #[arg(long, global = true, default_value = "100")]
    pub max_concurrency: usize,

    /// Resolve sibling fields one at a time
    #[arg(long, global = true)]
    pub sequential: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Admin,
    User,
}

impl RoleArg {
    fn as_str(self) -> &'static str {
        match self {
            RoleArg::Admin => "ADMIN",
            RoleArg::User => "USER",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a user by id and role
    Admin {
        id: String,

        /// Required role (the schema default is ADMIN)
        #[arg(short, long, value_enum)]
        role: Option<RoleArg>,

        /// Fields to select, comma separated
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Look up a user by id
    User {
        id: String,

        /// Fields to select, comma separated
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Include the user's friends
        #[arg(long)]
        friends: bool,

        /// Start offset into the friends list
        #[arg(long)]
        friends_first: Option<f64>,

        /// End offset into the friends list (0 means no bound)
        #[arg(long)]
        friends_last: Option<f64>,
    },

    /// Search users by name (case-sensitive substring)
    Search {
        text: String,

        /// Fields to select, comma separated
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Print the schema
    Schema,
}

impl Cli {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrent_fields: self.max_concurrency,
            parallel: !self.sequential,
            tracing: self.verbose,
        }
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_depth: self.max_depth,
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "social_cli=debug,social_graph=debug,social_runtime=debug"
        } else if self.quiet {
            "error"
        } else {
            "social_cli=info,social_graph=info,social_runtime=warn"
        }
    }
}

fn selection(fields: &[String], defaults: &[&str]) -> Vec<SelectionNode> {
    if fields.is_empty() {
        defaults.iter().map(|f| SelectionNode::new(*f)).collect()
    } else {
        fields.iter().map(|f| SelectionNode::new(f.trim())).collect()
    }
}

/// Builds the operation for a query command. `None` for commands that do not
/// query.
pub fn operation(command: &Commands) -> Option<Operation> {
    let root = match command {
        Commands::Admin { id, role, fields } => {
            let mut node = SelectionNode::new("admin").arg("id", json!(id));
            if let Some(role) = role {
                node = node.arg("role", json!(role.as_str()));
            }
            node.selected = selection(fields, ADMIN_FIELDS);
            node
        }
        Commands::User {
            id,
            fields,
            friends,
            friends_first,
            friends_last,
        } => {
            let mut node = SelectionNode::new("user").arg("id", json!(id));
            node.selected = selection(fields, USER_FIELDS);
            if *friends || friends_first.is_some() || friends_last.is_some() {
                let mut page = Map::new();
                if let Some(first) = friends_first {
                    page.insert("first".to_string(), json!(first));
                }
                if let Some(last) = friends_last {
                    page.insert("last".to_string(), json!(last));
                }
                let mut friends = SelectionNode::new("friends").select_all(FRIEND_FIELDS.iter().copied());
                if !page.is_empty() {
                    friends = friends.arg("page", Value::Object(page));
                }
                node = node.select(friends);
            }
            node
        }
        Commands::Search { text, fields } => {
            let mut node = SelectionNode::new("search").arg("text", json!(text));
            node.selected = selection(fields, SEARCH_FIELDS);
            node
        }
        Commands::Schema => return None,
    };
    Some(Operation::query(vec![root]))
}

/// Runs a parsed command line. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(operation) = operation(&cli.command) else {
        print!("{}", SDL);
        return Ok(0);
    };

    let store = Arc::new(fixture::store()?);
    let executor = executor(store, cli.executor_config());
    let planner = QueryPlanner::with_config(cli.planner_config());

    debug!(depth = operation.depth(), "running query");
    let response = executor.run(&planner, &operation, &Context::new()).await;
    print_response(&response, cli.compact)?;

    if !response.has_errors() {
        return Ok(0);
    }
    if !cli.quiet {
        for error in response.errors.iter().flatten() {
            eprintln!("{} {}", "error:".red().bold(), describe(error));
        }
    }
    Ok(1)
}

fn print_response(response: &Response, compact: bool) -> Result<(), serde_json::Error> {
    let text = if compact {
        serde_json::to_string(response)?
    } else {
        serde_json::to_string_pretty(response)?
    };
    println!("{}", text);
    Ok(())
}

fn describe(error: &FieldError) -> String {
    let mut text = error.message.clone();
    if let Some(code) = error.code() {
        text.push_str(&format!(" [{}]", code.yellow()));
    }
    if let Some(path) = &error.path {
        let path: Vec<String> = path
            .iter()
            .map(|segment| match segment {
                PathSegment::Field(name) => name.clone(),
                PathSegment::Index(i) => i.to_string(),
            })
            .collect();
        text.push_str(&format!(" at {}", path.join(".").blue()));
    }
    text
}
