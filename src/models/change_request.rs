//! Change request records (`change_request.do`).

use super::record::{record, Record};

record! {
    /// A ServiceNow change request.
    pub struct ChangeRequest {
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
        backout_plan,
        business_duration,
        business_service,
        cab_date,
        cab_delegate,
        cab_recommendation,
        cab_required,
        calendar_duration,
        category,
        change_plan,
        chg_model,
        close_code,
        close_notes,
        closed_at,
        closed_by,
        cmdb_ci,
        comments,
        comments_and_work_notes,
        company,
        conflict_last_run,
        conflict_status,
        contact_type,
        correlation_display,
        correlation_id,
        description,
        due_date,
        end_date,
        escalation,
        expected_start,
        follow_up,
        group_list,
        impact,
        implementation_plan,
        justification,
        knowledge,
        location,
        made_sla,
        /// Human-readable record number, unique per table.
        number,
        on_hold,
        on_hold_reason,
        on_hold_task,
        opened_at,
        opened_by,
        order,
        outside_maintenance_schedule,
        parent,
        phase,
        phase_state,
        priority,
        production_system,
        reason,
        reassignment_count,
        requested_by,
        requested_by_date,
        review_comments,
        review_date,
        review_status,
        risk,
        risk_impact_analysis,
        risk_value,
        route_reason,
        scope,
        service_offering,
        /// One-line summary shown in lists.
        short_description,
        skills,
        sla_due,
        sn_esign_document,
        sn_esign_esignature_configuration,
        start_date,
        /// Numeric state code as a string.
        state,
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
        test_plan,
        time_worked,
        /// Change type: `normal`, `standard` or `emergency`.
        change_type => "type",
        unauthorized,
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

impl Record for ChangeRequest {
    const PATH: &'static str = "change_request.do";
    const KIND: &'static str = "change request";

    fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    fn sys_id(&self) -> Option<&str> {
        self.sys_id.as_deref()
    }
}
