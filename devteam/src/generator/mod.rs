//! Generates the Next.js app files from a build's role outputs

mod templates;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::fs;

use templates::*;

/// Role outputs a build hands to the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppArtifacts {
    pub name: String,
    pub requirements: String,
    pub frontend_code: String,
    pub backend_code: String,
    /// Present when the premium payment role ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_code: Option<String>,
}

impl AppArtifacts {
    pub fn has_payments(&self) -> bool {
        self.payment_code.as_deref().is_some_and(|code| !code.trim().is_empty())
    }
}

/// One file to write, relative to the app root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    fn new(path: &str, content: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            content: content.into(),
        }
    }
}

fn package_json(has_payments: bool) -> String {
    let mut dependencies = json!({
        "next": "14.1.0",
        "react": "^18.2.0",
        "react-dom": "^18.2.0",
        "typescript": "^5.3.3",
        "@types/node": "^20.11.0",
        "@types/react": "^18.2.48",
        "@types/react-dom": "^18.2.18",
        "tailwindcss": "^3.4.1",
        "autoprefixer": "^10.4.17",
        "postcss": "^8.4.33"
    });
    if has_payments {
        dependencies["stripe"] = json!("^14.14.0");
        dependencies["@stripe/stripe-js"] = json!("^2.4.0");
    }

    let package = json!({
        "name": "todo-app",
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "next dev",
            "build": "next build",
            "start": "next start",
            "lint": "next lint"
        },
        "dependencies": dependencies
    });
    serde_json::to_string_pretty(&package).unwrap_or_else(|_| package.to_string())
}

fn main_page(has_payments: bool) -> String {
    let (imports, button) = if has_payments {
        (
            "import TodoApp from '@/components/TodoApp';\nimport CheckoutButton from '@/components/CheckoutButton';",
            "\n      <CheckoutButton />",
        )
    } else {
        ("import TodoApp from '@/components/TodoApp';", "")
    };

    format!(
        "{imports}

export default function Home() {{
  return (
    <main className=\"min-h-screen bg-gray-50 py-8\">
      <TodoApp />{button}
    </main>
  );
}}"
    )
}

fn readme(has_payments: bool) -> String {
    let mut readme = String::from(
        "# Todo App - Built by devteam

This application was generated by an AI development team.

## Features

- ✅ Create, complete, and delete todos
- 💾 In-memory storage (easily replaceable with a database)
- 🎨 Modern UI with Tailwind CSS
- 📱 Fully responsive design
",
    );
    if has_payments {
        readme.push_str("- 💳 Stripe payment integration for Pro features\n");
    }

    readme.push_str("\n## Getting Started\n\n1. Install dependencies:\n   ```bash\n   npm install\n   ```\n\n");
    let open_step = if has_payments {
        readme.push_str("2. Set up environment variables:\n   - Copy `.env.local.example` to `.env.local`\n   - Add your Stripe API keys\n\n3. ");
        4
    } else {
        readme.push_str("2. ");
        3
    };
    readme.push_str(&format!(
        "Run the development server:\n   ```bash\n   npm run dev\n   ```\n\n{}. Open [http://localhost:3000](http://localhost:3000)\n",
        open_step
    ));

    readme.push_str(
        "\n## Built By\n\n- **Product Manager**: Defined requirements and features\n- **Frontend Developer**: Built the React UI components\n- **Backend Developer**: Created the API routes\n",
    );
    if has_payments {
        readme.push_str("- **Stripe Expert**: Integrated payment processing\n");
    }

    readme.push_str("\n## Next Steps\n\n- Add a database (PostgreSQL, MongoDB, etc.)\n- Implement user authentication\n- Add more features like categories, due dates, etc.\n");
    readme.push_str(if has_payments {
        "- Configure Stripe webhooks for subscription management\n"
    } else {
        "- Add payment processing with the Stripe Expert role\n"
    });
    readme
}

fn role_note(title: &str, body: &str) -> String {
    format!("# {}\n\n{}\n", title, body)
}

/// Every file of the app, in write order. Pure; touches no filesystem.
pub fn generate(artifacts: &AppArtifacts) -> Vec<GeneratedFile> {
    let payments = artifacts.has_payments();

    let mut files = vec![
        GeneratedFile::new("package.json", package_json(payments)),
        GeneratedFile::new("src/app/page.tsx", main_page(payments)),
        GeneratedFile::new("src/app/layout.tsx", LAYOUT),
        GeneratedFile::new("src/app/globals.css", GLOBAL_STYLES),
        GeneratedFile::new("src/components/TodoApp.tsx", TODO_COMPONENT),
        GeneratedFile::new("src/app/api/todos/route.ts", TODOS_ROUTE),
    ];

    if payments {
        files.push(GeneratedFile::new(
            "src/app/api/create-checkout-session/route.ts",
            CHECKOUT_ROUTE,
        ));
        files.push(GeneratedFile::new("src/components/CheckoutButton.tsx", CHECKOUT_BUTTON));
        files.push(GeneratedFile::new(".env.local.example", ENV_EXAMPLE));
    }

    files.extend([
        GeneratedFile::new("tailwind.config.js", TAILWIND_CONFIG),
        GeneratedFile::new("postcss.config.js", POSTCSS_CONFIG),
        GeneratedFile::new("next.config.js", NEXT_CONFIG),
        GeneratedFile::new("tsconfig.json", TS_CONFIG),
        GeneratedFile::new("README.md", readme(payments)),
        GeneratedFile::new("docs/requirements.md", role_note("Requirements", &artifacts.requirements)),
        GeneratedFile::new("docs/frontend.md", role_note("Frontend", &artifacts.frontend_code)),
        GeneratedFile::new("docs/backend.md", role_note("Backend", &artifacts.backend_code)),
    ]);

    if let Some(code) = artifacts.payment_code.as_deref().filter(|_| payments) {
        files.push(GeneratedFile::new("docs/payments.md", role_note("Payments", code)));
    }

    files
}

/// Write `files` below `root`, creating directories as needed
pub async fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Generate the app into `output_dir/<name>` and return that directory
pub async fn generate_app(output_dir: &Path, artifacts: &AppArtifacts) -> Result<(PathBuf, usize)> {
    let root = output_dir.join(&artifacts.name);
    let files = generate(artifacts);
    write_files(&root, &files).await?;
    tracing::info!(path = %root.display(), files = files.len(), "Generated app");
    Ok((root, files.len()))
}
