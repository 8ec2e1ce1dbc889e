//! Standard change template proposals (`std_change_proposal.do`).
//!
//! Templates carry their field values in `template_value`, an encoded query
//! string; fields outside the declared set can be sent through `extra`.

use super::record::{record, Record};

record! {
    /// A proposal for a standard change template.
    pub struct StandardChangeTemplate {
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
        business_justification,
        business_service,
        calendar_duration,
        catalog,
        category,
        change_requests,
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
        created_from_change,
        description,
        due_date,
        escalation,
        expected_start,
        follow_up,
        group_list,
        impact,
        knowledge,
        location,
        made_sla,
        /// Human-readable record number, unique per table.
        number,
        opened_at,
        opened_by,
        order,
        parent,
        priority,
        proposal_type,
        reassignment_count,
        route_reason,
        service_offering,
        /// One-line summary shown in lists.
        short_description,
        skills,
        sla_due,
        sn_esign_document,
        sn_esign_esignature_configuration,
        /// Numeric state code as a string.
        state,
        std_change_producer,
        std_change_producer_version,
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
        task_effective_number,
        template_name,
        template_value,
        time_worked,
        universal_request,
        upon_approval,
        upon_reject,
        urgency,
        user_input,
        watch_list,
        work_end,
        work_notes,
        work_notes_list,
        work_start,
    }
}

impl Record for StandardChangeTemplate {
    const PATH: &'static str = "std_change_proposal.do";
    const KIND: &'static str = "standard change template";

    fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    fn sys_id(&self) -> Option<&str> {
        self.sys_id.as_deref()
    }
}
