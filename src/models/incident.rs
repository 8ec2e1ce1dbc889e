//! Incident records (`incident.do`).

use super::record::{record, Record};

record! {
    /// A ServiceNow incident.
    ///
    /// Every field is optional; only fields that are `Some` are sent on create
    /// or update.
    pub struct Incident {
        /// Status of the write reported by the server.
        status => "__status",
        active,
        activity_due,
        additional_assignee_list,
        approval,
        approval_history,
        approval_set,
        assigned_to,
        assignment_group,
        business_duration,
        business_service,
        business_stc,
        calendar_duration,
        calendar_stc,
        caller_id,
        category,
        caused_by,
        child_incidents,
        close_code,
        closed_at,
        closed_by,
        close_notes,
        cmdb_ci,
        comments,
        comments_and_work_notes,
        company,
        contact_type,
        correlation_display,
        correlation_id,
        delivery_plan,
        delivery_task,
        description,
        due_date,
        escalation,
        expected_start,
        follow_up,
        group_list,
        impact,
        incident_state,
        knowledge,
        location,
        made_sla,
        notify,
        /// Human-readable record number, unique per table.
        number,
        opened_at,
        opened_by,
        order,
        parent,
        parent_incident,
        priority,
        problem_id,
        reassignment_count,
        rejection_goto,
        reopen_count,
        resolved_at,
        resolved_by,
        rfc,
        severity,
        /// One-line summary shown in lists.
        short_description,
        sla_due,
        /// Numeric state code as a string.
        state,
        subcategory,
        sys_class_name,
        sys_created_by,
        sys_created_on,
        sys_domain,
        sys_domain_path,
        /// Unique 32 character identifier of the record.
        sys_id,
        sys_mod_count,
        sys_tags,
        sys_updated_by,
        sys_updated_on,
        time_worked,
        upon_approval,
        upon_reject,
        urgency,
        user_input,
        watch_list,
        wf_activity,
        work_end,
        work_notes,
        work_notes_list,
        work_start,
    }
}

impl Record for Incident {
    const PATH: &'static str = "incident.do";
    const KIND: &'static str = "incident";

    fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    fn sys_id(&self) -> Option<&str> {
        self.sys_id.as_deref()
    }
}
