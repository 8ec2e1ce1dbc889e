//! Command-line arguments for the `snow` binary.
//!
//! String arguments are trimmed before use; a value that is blank after
//! trimming counts as not given.

use clap::{Parser, Subcommand, ValueEnum};

use servicenow::models::Incident;
use servicenow::options::{DisplayValue, Filter};

/// Trims an optional string, dropping it when nothing is left.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Query and edit ServiceNow records through the JSONv2 web service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Abort the command after this many seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub deadline: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Record tables the CLI can reach.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// `incident.do`
    Incidents,
    /// `change_request.do`
    Changes,
    /// `std_change_proposal.do`
    Templates,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records, optionally filtered.
    List {
        #[arg(value_enum)]
        resource: Resource,

        /// Maximum number of records to return.
        #[arg(short, long)]
        limit: Option<u32>,

        /// Render reference fields as display values (true, false or all).
        #[arg(short, long)]
        display_value: Option<DisplayValue>,

        /// Filter clause such as `active=true` or `short_descriptionLIKEdisk`.
        /// Repeat to combine clauses in order.
        #[arg(short, long = "filter", value_name = "KEY<OP>VALUE")]
        filters: Vec<Filter>,
    },

    /// Show one record by number.
    Get {
        #[arg(value_enum)]
        resource: Resource,

        /// Record number, e.g. INC0010001.
        number: String,

        /// Render reference fields as display values (true, false or all).
        #[arg(short, long)]
        display_value: Option<DisplayValue>,
    },

    /// Open a new incident. Unset fields take the SERVICENOW_DEFAULT_* values.
    CreateIncident(CreateIncidentArgs),

    /// Change fields of an existing incident.
    UpdateIncident(UpdateIncidentArgs),

    /// Delete one record by sys_id.
    Delete {
        #[arg(value_enum)]
        resource: Resource,

        /// The record's sys_id.
        sys_id: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct CreateIncidentArgs {
    /// One-line summary.
    #[arg(short, long)]
    pub short_description: String,

    /// Full description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Caller sys_id or name.
    #[arg(long)]
    pub caller_id: Option<String>,

    /// Impact, 1 (high) to 3 (low).
    #[arg(long)]
    pub impact: Option<String>,

    /// Urgency, 1 (high) to 3 (low).
    #[arg(long)]
    pub urgency: Option<String>,
}

impl CreateIncidentArgs {
    /// Builds the incident to send. Fields left out stay unset.
    pub fn to_incident(&self) -> Incident {
        Incident {
            short_description: trim_option(&Some(self.short_description.clone())),
            description: trim_option(&self.description),
            caller_id: trim_option(&self.caller_id),
            impact: trim_option(&self.impact),
            urgency: trim_option(&self.urgency),
            ..Default::default()
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct UpdateIncidentArgs {
    /// Incident number, e.g. INC0010001.
    pub number: String,

    /// New state value.
    #[arg(long)]
    pub state: Option<String>,

    /// Work note to append.
    #[arg(long)]
    pub work_notes: Option<String>,

    /// Customer-visible comment to append.
    #[arg(long)]
    pub comments: Option<String>,

    /// Close code, required by most instances when resolving.
    #[arg(long)]
    pub close_code: Option<String>,

    /// Resolution notes.
    #[arg(long)]
    pub close_notes: Option<String>,
}

impl UpdateIncidentArgs {
    /// Builds the partial incident carrying only the changed fields.
    pub fn to_incident(&self) -> Incident {
        Incident {
            state: trim_option(&self.state),
            work_notes: trim_option(&self.work_notes),
            comments: trim_option(&self.comments),
            close_code: trim_option(&self.close_code),
            close_notes: trim_option(&self.close_notes),
            ..Default::default()
        }
    }

    /// Returns true when no field would change.
    pub fn is_empty(&self) -> bool {
        self.to_incident() == Incident::default()
    }
}
