//! HTML layouts for each notification kind.
//!
//! Every layout shares one frame (header, content, footer); only the colours,
//! heading and inner content differ. Content blocks use `{{variable}}`
//! placeholders resolved by the substitution engine.

/// Visual and textual parts of one layout
pub(crate) struct Layout {
    pub title: &'static str,
    pub gradient: &'static str,
    pub accent: &'static str,
    pub heading: &'static str,
    pub subtitle: &'static str,
    pub content: &'static str,
    pub footer: &'static str,
}

const ATTENDANCE_SYSTEM: &str = "University Attendance System";
const PROJECT_SYSTEM: &str = "Project Management System";

const NO_REPLY: &str = "<p>Please do not reply to this email</p>";

pub(crate) const ABSENCE: Layout = Layout {
    title: "Absence Notification",
    gradient: "#667eea 0%, #764ba2 100%",
    accent: "#667eea",
    heading: "Absence Notification",
    subtitle: ATTENDANCE_SYSTEM,
    content: r#"<h2>Dear {{directorName}},</h2>
<p>An absence has been detected:</p>
<div class="info-box" style="background: #fff3cd; border-left: 4px solid #ffc107;">
  <h3>Absence details:</h3>
  <p><strong>Helper:</strong> {{helperName}}</p>
  <p><strong>Helper ID:</strong> {{helperId}}</p>
  <p><strong>Date:</strong> {{date}}</p>
  <p><strong>Project:</strong> {{projectName}}</p>
</div>
<p>We recommend contacting the helper to learn the reason for the absence and take the appropriate action.</p>
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">Go to the Attendance System</a>
</div>"#,
    footer: ATTENDANCE_SYSTEM,
};

pub(crate) const PROGRESS_SUBMITTED: Layout = Layout {
    title: "New Progress Report",
    gradient: "#4facfe 0%, #00f2fe 100%",
    accent: "#4facfe",
    heading: "New Project Progress Report",
    subtitle: PROJECT_SYSTEM,
    content: r#"<h2>Dear {{supervisorName}},</h2>
<p>A new project progress report has been submitted:</p>
<div class="info-box" style="background: #d4edda; border-left: 4px solid #28a745;">
  <h3>Report details:</h3>
  <p><strong>Project Director:</strong> {{directorName}}</p>
  <p><strong>Project:</strong> {{projectName}}</p>
  <p><strong>Submitted at:</strong> {{submittedAt}}</p>
  <p><strong>Description:</strong> {{description}}</p>
</div>
<p>Please review the report and approve or reject it as appropriate.</p>
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">Review Report</a>
</div>"#,
    footer: PROJECT_SYSTEM,
};

pub(crate) const PROGRESS_APPROVED: Layout = Layout {
    title: "Progress Approved",
    gradient: "#11998e 0%, #38ef7d 100%",
    accent: "#11998e",
    heading: "Progress Approved",
    subtitle: PROJECT_SYSTEM,
    content: r#"<h2>Congratulations {{directorName}}!</h2>
<p>Your progress report has been approved:</p>
<div class="info-box" style="background: #d4edda; border-left: 4px solid #28a745;">
  <h3>Details:</h3>
  <p><strong>Project:</strong> {{projectName}}</p>
  <p><strong>Approved at:</strong> {{approvedAt}}</p>
  <p><strong>Approved by:</strong> {{supervisorName}}</p>
  <p><strong>Comments:</strong> {{comments}}</p>
</div>
<p>You can move on to the next phase of the project. Excellent work!</p>
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">View Project</a>
</div>"#,
    footer: PROJECT_SYSTEM,
};

pub(crate) const PROGRESS_REJECTED: Layout = Layout {
    title: "Progress Requires Revision",
    gradient: "#eb3349 0%, #f45c43 100%",
    accent: "#eb3349",
    heading: "Progress Requires Revision",
    subtitle: PROJECT_SYSTEM,
    content: r#"<h2>Dear {{directorName}},</h2>
<p>Your progress report has been reviewed and needs some changes:</p>
<div class="info-box" style="background: #fff3cd; border-left: 4px solid #ffc107;">
  <h3>Review details:</h3>
  <p><strong>Project:</strong> {{projectName}}</p>
  <p><strong>Reviewed at:</strong> {{reviewedAt}}</p>
  <p><strong>Reviewed by:</strong> {{supervisorName}}</p>
  <p><strong>Rejection reason:</strong> {{rejectionReason}}</p>
  <p><strong>Remarks:</strong> {{remarks}}</p>
</div>
<p>Please make the necessary corrections and submit the report again.</p>
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">Fix Report</a>
</div>"#,
    footer: PROJECT_SYSTEM,
};

const PASSWORD_WARNING: &str = r#"<div class="info-box" style="background: #fff3cd; border-left: 4px solid #ffc107;">
  <p><strong>Important:</strong> for security, change your temporary password the first time you sign in.</p>
</div>"#;

pub(crate) const DIRECTOR_CREDENTIALS: Layout = Layout {
    title: "Welcome Project Director",
    gradient: "#667eea 0%, #764ba2 100%",
    accent: "#667eea",
    heading: "Welcome Project Director",
    subtitle: ATTENDANCE_SYSTEM,
    content: r#"<h2>Dear {{name}},</h2>
<p>Welcome to the University Attendance System. Your sign-in credentials are:</p>
<div class="info-box" style="background: #e3f2fd; border-left: 4px solid #2196f3;">
  <h3>Credentials:</h3>
  <p><strong>Username:</strong> {{username}}</p>
  <p><strong>Temporary password:</strong> {{temporaryPassword}}</p>
  <p><strong>Role:</strong> Project Director</p>
  <p><strong>Code:</strong> {{code}}</p>
</div>
{{passwordWarning}}
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">Sign In</a>
</div>"#,
    footer: ATTENDANCE_SYSTEM,
};

pub(crate) const STAFF_CREDENTIALS: Layout = Layout {
    title: "Welcome Staff",
    gradient: "#11998e 0%, #38ef7d 100%",
    accent: "#11998e",
    heading: "Welcome to the System",
    subtitle: ATTENDANCE_SYSTEM,
    content: r#"<h2>Dear {{name}},</h2>
<p>You have been registered in the University Attendance System. Your sign-in credentials are:</p>
<div class="info-box" style="background: #e8f5e8; border-left: 4px solid #4caf50;">
  <h3>Credentials:</h3>
  <p><strong>Username:</strong> {{username}}</p>
  <p><strong>Temporary password:</strong> {{temporaryPassword}}</p>
  <p><strong>Role:</strong> {{role}}</p>
  <p><strong>Code:</strong> {{code}}</p>
</div>
{{passwordWarning}}
<div style="text-align: center; margin: 30px 0;">
  <a href="{{systemUrl}}" class="btn">Sign In</a>
</div>"#,
    footer: ATTENDANCE_SYSTEM,
};

pub(crate) const DEFAULT: Layout = Layout {
    title: "System Notification",
    gradient: "#667eea 0%, #764ba2 100%",
    accent: "#667eea",
    heading: "System Notification",
    subtitle: ATTENDANCE_SYSTEM,
    content: "<p>{{message}}</p>",
    footer: ATTENDANCE_SYSTEM,
};

/// Build the complete document for a layout, placeholders still unresolved
pub(crate) fn frame(layout: &Layout) -> String {
    let content = layout.content.replace("{{passwordWarning}}", PASSWORD_WARNING);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }}
    .container {{ max-width: 600px; margin: 0 auto; background: white; border-radius: 10px; overflow: hidden; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }}
    .header {{ background: linear-gradient(135deg, {gradient}); color: white; padding: 30px; text-align: center; }}
    .content {{ padding: 30px; }}
    .info-box {{ padding: 15px; margin: 20px 0; border-radius: 5px; }}
    .footer {{ background: #f8f9fa; padding: 20px; text-align: center; color: #666; }}
    .btn {{ display: inline-block; padding: 12px 24px; background: {accent}; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>{heading}</h1>
      <p>{subtitle}</p>
    </div>
    <div class="content">
{content}
    </div>
    <div class="footer">
      <p>This is an automated message from the {footer}</p>
      {no_reply}
    </div>
  </div>
</body>
</html>
"#,
        title = layout.title,
        gradient = layout.gradient,
        accent = layout.accent,
        heading = layout.heading,
        subtitle = layout.subtitle,
        content = content,
        footer = layout.footer,
        no_reply = NO_REPLY,
    )
}
