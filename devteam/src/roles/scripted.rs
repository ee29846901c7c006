//! Scripted roles with canned output

use async_trait::async_trait;
use serde_json::Value;

use devteam_sdk::{MarketplaceRoleMetadata, Result, Role, RoleResult, WorkflowContext};

use super::{team_prompt, TeamMember};
use crate::cost::CostTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Script {
    Member(TeamMember),
    /// Generic premium role: acknowledges the task
    Echo,
}

/// A role that answers from a script instead of a completion backend.
///
/// Optionally bills a fixed cost per execution to a ledger under the
/// provider name `scripted`.
#[derive(Debug, Clone)]
pub struct ScriptedRole {
    id: String,
    name: String,
    prompt: String,
    script: Script,
    billing: Option<(CostTracker, f64)>,
}

impl ScriptedRole {
    pub fn member(member: TeamMember) -> Self {
        Self {
            id: member.id().to_string(),
            name: member.name().to_string(),
            prompt: team_prompt(member.name(), member.prompt()),
            script: Script::Member(member),
            billing: None,
        }
    }

    /// The core team
    pub fn team() -> Vec<Self> {
        TeamMember::CORE.into_iter().map(Self::member).collect()
    }

    pub fn for_marketplace(metadata: &MarketplaceRoleMetadata) -> Self {
        match TeamMember::from_id(&metadata.id) {
            Some(member) => Self {
                name: metadata.name.clone(),
                ..Self::member(member)
            },
            None => Self {
                id: metadata.id.clone(),
                name: metadata.name.clone(),
                prompt: team_prompt(&metadata.name, &metadata.description),
                script: Script::Echo,
                billing: None,
            },
        }
    }

    /// Record `cost` on `ledger` for every execution
    pub fn with_billing(mut self, ledger: CostTracker, cost: f64) -> Self {
        self.billing = Some((ledger, cost.max(0.0)));
        self
    }

    fn render(&self, input: &Value) -> String {
        match &self.script {
            Script::Member(TeamMember::ProductManager) => requirements(&input_text(input)),
            Script::Member(TeamMember::FrontendDeveloper) => {
                let requirements = input
                    .get("requirements")
                    .map(value_text)
                    .unwrap_or_else(|| input_text(input));
                frontend_component(&requirements)
            }
            Script::Member(TeamMember::BackendDeveloper) => BACKEND_ROUTE.to_string(),
            Script::Member(TeamMember::StripeExpert) => STRIPE_INTEGRATION.to_string(),
            Script::Echo => format!("{} completed: {}", self.name, input_text(input)),
        }
    }
}

#[async_trait]
impl Role for ScriptedRole {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn system_prompt(&self) -> String {
        self.prompt.clone()
    }

    async fn execute(&self, input: &Value, _context: &WorkflowContext) -> Result<RoleResult> {
        let output = self.render(input);
        let mut result = RoleResult::new(output);

        if let Script::Member(member) = &self.script {
            result = result
                .with_next_steps(member.next_steps().iter().copied())
                .with_dependencies(member.dependencies().iter().copied());
        }
        if let Some((ledger, cost)) = &self.billing {
            ledger.track("scripted", "scripted", 0, 0, *cost, &self.id);
            result = result.with_cost(*cost);
        }

        Ok(result)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn input_text(input: &Value) -> String {
    match input {
        Value::Null => String::new(),
        other => value_text(other),
    }
}

fn requirements(input: &str) -> String {
    format!(
        "# Todo Application Requirements

## Overview
A modern todo application with the following features:

## Core Features
1. **Task Management**
   - Create new todos
   - Mark todos as complete
   - Delete todos
   - Edit todo text

2. **User Interface**
   - Clean, modern design
   - Responsive layout
   - Real-time updates

3. **Data Persistence**
   - Local storage for now
   - API ready for backend

## Technical Requirements
- React with TypeScript
- Tailwind CSS for styling
- Component-based architecture
- Mobile-friendly design

Input: {input}"
    )
}

fn frontend_component(requirements: &str) -> String {
    let summary: String = requirements.chars().take(50).collect();
    format!(
        "// TodoApp.tsx
import React, {{ useState }} from 'react';

interface Todo {{
  id: number;
  text: string;
  completed: boolean;
}}

export function TodoApp() {{
  const [todos, setTodos] = useState<Todo[]>([]);
  const [inputText, setInputText] = useState('');

  const addTodo = () => {{
    if (inputText.trim()) {{
      setTodos([...todos, {{
        id: Date.now(),
        text: inputText,
        completed: false
      }}]);
      setInputText('');
    }}
  }};

  return (
    <div className=\"max-w-md mx-auto mt-8 p-6\">
      <h1 className=\"text-2xl font-bold mb-4\">Todo App</h1>
      {{/* Implementation based on: {summary}... */}}
    </div>
  );
}}"
    )
}

const BACKEND_ROUTE: &str = "// api/todos.ts
import { NextApiRequest, NextApiResponse } from 'next';

let todos: Todo[] = [];

export default function handler(req: NextApiRequest, res: NextApiResponse) {
  switch (req.method) {
    case 'GET':
      return res.status(200).json(todos);
    case 'POST':
      const newTodo = { ...req.body, id: Date.now() };
      todos.push(newTodo);
      return res.status(201).json(newTodo);
    default:
      return res.status(405).end();
  }
}";

const STRIPE_INTEGRATION: &str = "// api/create-checkout-session.ts
import Stripe from 'stripe';
const stripe = new Stripe(process.env.STRIPE_SECRET_KEY!);

export default async function handler(req, res) {
  const session = await stripe.checkout.sessions.create({
    payment_method_types: ['card'],
    line_items: [{
      price_data: {
        currency: 'usd',
        product_data: { name: 'Todo Pro Subscription' },
        unit_amount: 999,
      },
      quantity: 1,
    }],
    mode: 'subscription',
    success_url: `${req.headers.origin}/success`,
    cancel_url: `${req.headers.origin}/cancel`,
  });

  res.status(200).json({ sessionId: session.id });
}

// CheckoutButton.tsx
import { loadStripe } from '@stripe/stripe-js';

export const CheckoutButton = () => {
  const handleCheckout = async () => {
    const stripe = await loadStripe(process.env.NEXT_PUBLIC_STRIPE_KEY!);
    const response = await fetch('/api/create-checkout-session', { method: 'POST' });
    const session = await response.json();
    await stripe?.redirectToCheckout({ sessionId: session.sessionId });
  };

  return (
    <button onClick={handleCheckout} className=\"bg-purple-600 text-white px-4 py-2 rounded\">
      Upgrade to Pro - $9.99/mo
    </button>
  );
};";
