use serde::{Deserialize, Serialize};

use crate::portfolio::{Activity, Project};

const ACTIVITY_WEIGHT_TIME: f64 = 0.3;
const ACTIVITY_WEIGHT_RESOURCES: f64 = 0.2;
const ACTIVITY_WEIGHT_CRITICALITY: f64 = 0.3;
const ACTIVITY_WEIGHT_QUALITY: f64 = 0.2;

const PROJECT_WEIGHT_DURATION: f64 = 0.2;
const PROJECT_WEIGHT_TEAM: f64 = 0.15;
const PROJECT_WEIGHT_BUDGET: f64 = 0.15;
const PROJECT_WEIGHT_RISK: f64 = 0.25;
const PROJECT_WEIGHT_QUALITY: f64 = 0.25;

/// Grade used when an entity has no cached metrics yet.
const DEFAULT_QUALITY: f64 = 3.0;

/// One factor of a score, kept for the explain view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFactor {
    pub name: String,
    pub tier: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub factors: Vec<ScoreFactor>,
    pub base: f64,
    pub multiplier: f64,
    pub points: f64,
}

impl ScoreBreakdown {
    fn zero() -> Self {
        Self {
            factors: Vec::new(),
            base: 0.0,
            multiplier: 0.0,
            points: 0.0,
        }
    }
}

/// Complexity-weighted point score of an activity, rounded to one
/// decimal. An activity without complexity factors scores zero.
pub fn score_activity(activity: &Activity) -> f64 {
    activity_breakdown(activity).points
}

pub fn activity_breakdown(activity: &Activity) -> ScoreBreakdown {
    let Some(complexity) = &activity.complexity else {
        return ScoreBreakdown::zero();
    };
    let quality = activity
        .metrics
        .as_ref()
        .map(|m| m.quality_score)
        .unwrap_or(DEFAULT_QUALITY);

    let factors = vec![
        ScoreFactor {
            name: "time".to_string(),
            tier: hours_tier(complexity.estimated_hours),
            weight: ACTIVITY_WEIGHT_TIME,
        },
        ScoreFactor {
            name: "resources".to_string(),
            tier: resources_tier(complexity.resources_needed),
            weight: ACTIVITY_WEIGHT_RESOURCES,
        },
        ScoreFactor {
            name: "criticality".to_string(),
            tier: complexity.criticality.tier(),
            weight: ACTIVITY_WEIGHT_CRITICALITY,
        },
        ScoreFactor {
            name: "quality".to_string(),
            tier: quality,
            weight: ACTIVITY_WEIGHT_QUALITY,
        },
    ];
    finish(factors, activity.periodicity.score_multiplier())
}

/// Complexity-weighted point score of a project, rounded to one
/// decimal. A project without complexity factors scores zero.
pub fn score_project(project: &Project) -> f64 {
    project_breakdown(project).points
}

pub fn project_breakdown(project: &Project) -> ScoreBreakdown {
    let Some(complexity) = &project.complexity else {
        return ScoreBreakdown::zero();
    };
    let quality = project
        .metrics
        .as_ref()
        .map(|m| m.delivery_quality)
        .unwrap_or(DEFAULT_QUALITY);

    let factors = vec![
        ScoreFactor {
            name: "duration".to_string(),
            tier: duration_tier(complexity.duration_days),
            weight: PROJECT_WEIGHT_DURATION,
        },
        ScoreFactor {
            name: "team".to_string(),
            tier: team_tier(complexity.team_size),
            weight: PROJECT_WEIGHT_TEAM,
        },
        ScoreFactor {
            name: "budget".to_string(),
            tier: budget_tier(complexity.budget),
            weight: PROJECT_WEIGHT_BUDGET,
        },
        ScoreFactor {
            name: "risk".to_string(),
            tier: complexity.risk.tier(),
            weight: PROJECT_WEIGHT_RISK,
        },
        ScoreFactor {
            name: "quality".to_string(),
            tier: quality,
            weight: PROJECT_WEIGHT_QUALITY,
        },
    ];
    finish(factors, complexity.size.score_multiplier())
}

fn finish(factors: Vec<ScoreFactor>, multiplier: f64) -> ScoreBreakdown {
    let base: f64 = factors.iter().map(|f| f.tier * f.weight).sum();
    let points = round_one_decimal(base * multiplier);
    ScoreBreakdown {
        factors,
        base,
        multiplier,
        points,
    }
}

fn hours_tier(hours: f64) -> f64 {
    if hours <= 2.0 {
        1.0
    } else if hours <= 8.0 {
        2.0
    } else {
        3.0
    }
}

fn resources_tier(headcount: u32) -> f64 {
    if headcount <= 1 {
        1.0
    } else if headcount <= 3 {
        2.0
    } else {
        3.0
    }
}

fn duration_tier(days: u32) -> f64 {
    if days <= 30 {
        1.0
    } else if days <= 90 {
        2.0
    } else if days <= 180 {
        3.0
    } else {
        4.0
    }
}

fn team_tier(people: u32) -> f64 {
    if people <= 3 {
        1.0
    } else if people <= 8 {
        2.0
    } else if people <= 15 {
        3.0
    } else {
        4.0
    }
}

fn budget_tier(budget: f64) -> f64 {
    if budget <= 50_000.0 {
        1.0
    } else if budget <= 250_000.0 {
        2.0
    } else if budget <= 1_000_000.0 {
        3.0
    } else {
        4.0
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{
        ActivityComplexity, Criticality, Periodicity, ProjectComplexity, ProjectSize, RiskLevel,
        RoutineLevel,
    };

    fn activity(hours: f64, resources: u32, crit: Criticality, freq: Periodicity) -> Activity {
        let mut a = Activity::sample("a1");
        a.periodicity = freq;
        a.complexity = Some(ActivityComplexity {
            routine_level: RoutineLevel::Simple,
            estimated_hours: hours,
            resources_needed: resources,
            criticality: crit,
        });
        a.metrics = None;
        a
    }

    #[test]
    fn minimal_monthly_activity_scores_from_the_weighted_sum() {
        let a = activity(1.0, 1, Criticality::Low, Periodicity::Monthly);
        // 1*0.3 + 1*0.2 + 1*0.3 + 3*0.2, monthly multiplier 1.0
        assert_eq!(score_activity(&a), 1.4);
    }

    #[test]
    fn daily_frequency_multiplies_the_base() {
        let a = activity(1.0, 1, Criticality::Low, Periodicity::Daily);
        assert_eq!(score_activity(&a), 2.1); // 1.4 * 1.5 = 2.1
    }

    #[test]
    fn criticality_one_tier_apart_scores_strictly_higher() {
        let low = activity(4.0, 2, Criticality::Low, Periodicity::Weekly);
        let medium = activity(4.0, 2, Criticality::Medium, Periodicity::Weekly);
        let high = activity(4.0, 2, Criticality::High, Periodicity::Weekly);
        let critical = activity(4.0, 2, Criticality::Critical, Periodicity::Weekly);
        assert!(score_activity(&medium) > score_activity(&low));
        assert!(score_activity(&high) > score_activity(&medium));
        assert!(score_activity(&critical) > score_activity(&high));
    }

    #[test]
    fn scoring_is_pure() {
        let a = activity(6.0, 3, Criticality::High, Periodicity::Weekly);
        assert_eq!(score_activity(&a), score_activity(&a));
    }

    #[test]
    fn activity_without_complexity_scores_zero() {
        let mut a = Activity::sample("a1");
        a.complexity = None;
        assert_eq!(score_activity(&a), 0.0);
    }

    #[test]
    fn hour_and_resource_tiers_break_at_documented_boundaries() {
        assert_eq!(hours_tier(2.0), 1.0);
        assert_eq!(hours_tier(2.1), 2.0);
        assert_eq!(hours_tier(8.0), 2.0);
        assert_eq!(hours_tier(8.5), 3.0);
        assert_eq!(resources_tier(1), 1.0);
        assert_eq!(resources_tier(3), 2.0);
        assert_eq!(resources_tier(4), 3.0);
    }

    #[test]
    fn mega_project_scenario() {
        let mut p = Project::sample("p1");
        p.metrics = None;
        p.complexity = Some(ProjectComplexity {
            size: ProjectSize::Mega,
            duration_days: 400,
            team_size: 20,
            budget: 2_000_000.0,
            risk: RiskLevel::Critical,
        });
        // tiers 4/4/4/4 and default quality 3:
        // (4*0.2 + 4*0.15 + 4*0.15 + 4*0.25 + 3*0.25) * 2.5 = 9.375
        assert_eq!(score_project(&p), 9.4);
    }

    #[test]
    fn project_without_complexity_scores_zero() {
        let mut p = Project::sample("p1");
        p.complexity = None;
        assert_eq!(score_project(&p), 0.0);
    }

    #[test]
    fn project_tier_boundaries() {
        assert_eq!(duration_tier(30), 1.0);
        assert_eq!(duration_tier(91), 3.0);
        assert_eq!(duration_tier(181), 4.0);
        assert_eq!(team_tier(8), 2.0);
        assert_eq!(team_tier(16), 4.0);
        assert_eq!(budget_tier(50_000.0), 1.0);
        assert_eq!(budget_tier(1_000_001.0), 4.0);
    }
}
