use crate::provisioning::domain::IpCidr;
use crate::shared::Result;

/// Priority of the first allow rule
pub const ALLOW_PRIORITY_BASE: u32 = 10;

/// Priority of the deny rule when the allow rules fit below it
pub const DENY_PRIORITY: u32 = 20;

/// Highest priority an ALB listener rule accepts
const MAX_RULE_PRIORITY: u32 = 50_000;

/// An ALB listener rule holds at most five condition values in total
const MAX_CONDITION_VALUES: usize = 5;

pub const FORBIDDEN_STATUS_CODE: u16 = 403;
pub const FORBIDDEN_CONTENT_TYPE: &str = "text/html";
pub const FORBIDDEN_BODY: &str = "Your ip address is not authorized";

/// What a planned listener rule does with a matching request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Forward to the service's target group
    Forward,
    FixedResponse {
        status_code: u16,
        content_type: &'static str,
        body: &'static str,
    },
}

/// One listener rule, before it is rendered into a template resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRulePlan {
    pub priority: u32,
    pub path_patterns: Vec<String>,
    /// Empty means "any source"
    pub source_ips: Vec<IpCidr>,
    pub action: RuleAction,
}

/// AdminAccessPolicy restricts the admin path to an IP allow-list
///
/// Rules are evaluated lowest priority first:
/// 1. admin path AND source IP in the allow-list -> forward
/// 2. admin path from anywhere else -> fixed 403
///
/// Every other path falls through to the listener's default forward action.
pub struct AdminAccessPolicy;

impl AdminAccessPolicy {
    /// Plans the listener rules for an allow-list.
    ///
    /// Allow-lists larger than one rule can hold are split over consecutive
    /// priorities starting at [`ALLOW_PRIORITY_BASE`]. The deny rule always
    /// sits strictly above the last allow rule. An empty allow-list yields
    /// only the deny rule, so the admin path is closed to everyone.
    ///
    /// # Errors
    /// Returns an error if there are no path patterns, too many of them to
    /// leave room for a source IP, or so many CIDRs that priorities overflow
    pub fn plan(allow_list: &[IpCidr], path_patterns: &[String]) -> Result<Vec<ListenerRulePlan>> {
        if path_patterns.is_empty() {
            anyhow::bail!("Admin access policy needs at least one path pattern");
        }
        if path_patterns.len() >= MAX_CONDITION_VALUES {
            anyhow::bail!(
                "Admin access policy allows at most {} path patterns, got {}",
                MAX_CONDITION_VALUES - 1,
                path_patterns.len()
            );
        }

        let mut unique: Vec<IpCidr> = Vec::with_capacity(allow_list.len());
        for cidr in allow_list {
            if !unique.contains(cidr) {
                unique.push(*cidr);
            }
        }

        let per_rule = MAX_CONDITION_VALUES - path_patterns.len();
        let mut rules: Vec<ListenerRulePlan> = unique
            .chunks(per_rule)
            .enumerate()
            .map(|(i, chunk)| ListenerRulePlan {
                priority: ALLOW_PRIORITY_BASE + i as u32,
                path_patterns: path_patterns.to_vec(),
                source_ips: chunk.to_vec(),
                action: RuleAction::Forward,
            })
            .collect();

        let deny_priority = rules
            .last()
            .map(|last| DENY_PRIORITY.max(last.priority + 1))
            .unwrap_or(DENY_PRIORITY);
        if deny_priority > MAX_RULE_PRIORITY {
            anyhow::bail!(
                "Admin allow-list is too large: {} CIDR blocks need priorities beyond {}",
                unique.len(),
                MAX_RULE_PRIORITY
            );
        }

        rules.push(ListenerRulePlan {
            priority: deny_priority,
            path_patterns: path_patterns.to_vec(),
            source_ips: Vec::new(),
            action: RuleAction::FixedResponse {
                status_code: FORBIDDEN_STATUS_CODE,
                content_type: FORBIDDEN_CONTENT_TYPE,
                body: FORBIDDEN_BODY,
            },
        });

        Ok(rules)
    }
}
